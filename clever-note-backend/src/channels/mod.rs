pub mod dispatcher;
pub mod telegram;
pub mod types;
pub mod util;


pub use dispatcher::MessageDispatcher;
