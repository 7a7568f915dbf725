pub mod bitbucket;
