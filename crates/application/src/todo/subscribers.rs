use async_trait::async_trait;
use domain::TodoEvent;
use persistence::{EventSubscriber, SubscriberError};

/// Logs every completed todo item.
pub struct LogTodoItemCompleted;

#[async_trait]
impl EventSubscriber<TodoEvent> for LogTodoItemCompleted {
    fn name(&self) -> &'static str {
        "LogTodoItemCompleted"
    }

    async fn handle(&self, event: &TodoEvent) -> Result<(), SubscriberError> {
        if let TodoEvent::TodoItemCompleted(data) = event {
            tracing::info!(
                item_id = %data.item_id,
                list_id = %data.list_id,
                title = %data.title,
                completed_at = %data.completed_at,
                "todo item completed"
            );
        }
        Ok(())
    }
}
