pub mod email;
pub mod entity_store;
pub mod query_index;

pub use email::{BodyType, MailError, MailSender, OutgoingEmail, SmtpMailSender};
pub use entity_store::{EntityStore, InMemoryEntityStore, StoreError, StoreResult};
pub use query_index::{
    EntityQuery, InMemoryQueryIndex, QueryError, QueryIndex, QueryResults, FIELD_DELETED,
    FIELD_ENTITY_ID,
};
