pub mod server;

/// Actions parsed from the command line
#[derive(Debug)]
pub enum Action {
    Server {
        port: u16,
        dsn: String,
        base_url: String,
    },
}
