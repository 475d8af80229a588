// Page handlers and templates

pub mod pages;
