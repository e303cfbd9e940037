// API handlers - thin HTTP orchestration layer
// Handlers only deal with HTTP concerns:
// 1. Extract and validate parameters from the request
// 2. Open a unit of work and call domain logic
// 3. Commit or roll back, then shape the HTTP response

pub mod organizations;
pub mod prices;
pub mod storages;

pub use organizations::{
    available_storages_handler, create_organization_handler, delete_organization_handler,
    distance_to_storage_handler, generate_waste_handler, get_organization_handler,
    list_organizations_handler, transfer_waste_handler, update_organization_handler,
};
pub use prices::{latest_price_handler, price_history_handler, prices_by_ticker_handler, record_price_handler};
pub use storages::{
    create_storage_handler, delete_storage_handler, get_storage_handler, list_storages_handler,
    update_storage_handler,
};
