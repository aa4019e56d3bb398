//! Domain layer: income records, their monetary amounts and the checksum
//! that ties a record to the line it was imported from.

pub mod checksum;
pub mod money;
pub mod ports;
pub mod record;
