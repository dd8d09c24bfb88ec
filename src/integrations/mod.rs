//! External service integrations.

pub mod gateways {
    pub use crate::gateways::*;
}

pub mod supabase_client {
    pub use crate::supabase_client::*;
}

pub mod db_storage {
    pub use crate::db_storage::*;
}
