mod accounts_bucket;

pub use accounts_bucket::AccountsBucket;
