pub mod db;
pub mod embeddings;
pub mod mailer;
pub mod responder;
pub mod vector;

pub use db::PgAdapter;
pub use embeddings::OpenAiEmbeddingAdapter;
pub use mailer::HttpMailerAdapter;
pub use responder::OpenAiResponderAdapter;
pub use vector::PineconeIndexAdapter;
