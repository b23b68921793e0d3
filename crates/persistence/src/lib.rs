pub mod clock;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod publisher;
pub mod store;
pub mod unique_index;
pub mod unit_of_work;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{DatabaseError, PersistenceError, Result};
pub use memory::InMemoryTodoStore;
pub use postgres::PostgresTodoStore;
pub use publisher::{EventPublisher, EventSubscriber, SubscriberError};
pub use store::{TodoStore, TodoStoreExt, WriteBatch};
pub use unique_index::UniqueViolation;
pub use unit_of_work::{ChangeSet, UnitOfWork};
