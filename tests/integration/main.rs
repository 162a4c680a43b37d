mod crawl_tests;
mod property_tests;
