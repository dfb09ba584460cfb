mod dispatch;
pub mod http;
