pub mod recovery;
pub mod requests;
pub mod response;
