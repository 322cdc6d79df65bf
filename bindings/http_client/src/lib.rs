mod client;
mod response;

pub mod prelude {
    pub use crate::client::{HttpClient, DEFAULT_REQUEST_TIMEOUT, HTTP_GET_OPERATION};
    pub use crate::response::HttpResponse;
}
