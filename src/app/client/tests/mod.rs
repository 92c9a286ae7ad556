//! Tests for the SDMX client module
//!
//! `local_service` runs the client against a one-shot HTTP responder on the
//! loopback interface. `live_service` talks to the real IMF service and is
//! ignored by default.

mod live_service;
mod local_service;
