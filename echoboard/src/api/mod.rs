// Backend access: the feedback HTTP client and the trait the board drives.

pub mod client;
