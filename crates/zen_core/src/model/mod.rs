mod chat;
mod descriptor;
mod task;
mod user;

pub use chat::{ChatMessage, ChatRole};
pub use descriptor::{ActionTag, CommandDescriptor, TaskData};
pub use task::{Frequency, Priority, Recurrence, Task, TaskContext};
pub use user::User;
