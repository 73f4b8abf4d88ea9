pub mod message_service;
pub use message_service::{MessageError, MessageService};

pub mod message_service_impl;
pub use message_service_impl::SeaOrmMessageService;

pub mod user_service;
pub use user_service::{UserError, UserService};

pub mod user_service_impl;
pub use user_service_impl::SeaOrmUserService;
