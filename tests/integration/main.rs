//! Integration tests for docker-desktop-links

mod refresh_tests;
