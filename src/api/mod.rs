pub mod demo;
pub mod provider;
pub mod rest;
