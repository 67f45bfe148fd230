//! Domain model: deliveries, the component tree and computed information.
//!
//! Information is stored per component under an [`InfoKey`] made of the
//! delivery identifier and the data source name. Contents are small XML
//! trees ([`Element`]) so that they persist verbatim and can be spliced into
//! exported documents.

mod component;
mod content;
mod delivery;
mod information;
mod observable;

pub use component::{Component, InfoKey, StrategyAssignment};
pub use content::{Element, Node};
pub use delivery::{compare_ids, natural_cmp, parse_version_label, Delivery, DeliveryRegistry};
pub use information::{
    error_content, string_content, Commit, DeliveryInformation, InformationKind, BRANCH_TAG,
    COMMIT_TAG, CONTENT_TAG, ERROR_TAG, STRING_TAG, TAG_TAG,
};
pub use observable::{CollectionEvent, ListenerId, ObservableSet};
