// Unit and quantity arithmetic
pub mod conversion;
pub mod stockable;

// Stock, movements, perishables, losses
pub mod losses;
pub mod perishables;
pub mod stock;
pub mod stock_movements;

// Catalog
pub mod categories;
pub mod ingredients;
pub mod locations;
pub mod menus;
pub mod preparations;

// Order workflow
pub mod order_history;
pub mod order_status;
pub mod orders;

// Tenancy and front-of-house
pub mod companies;
pub mod dining_tables;

// External services
pub mod images;
pub mod open_food_facts;
