pub mod category;
pub mod category_location_type;
pub mod company;
pub mod company_business_hour;
pub mod dining_table;
pub mod ingredient;
pub mod ingredient_location;
pub mod location;
pub mod location_type;
pub mod loss;
pub mod menu;
pub mod menu_item;
pub mod order;
pub mod order_history;
pub mod order_step;
pub mod perishable;
pub mod preparation;
pub mod preparation_component;
pub mod preparation_location;
pub mod sea_orm_active_enums;
pub mod step_menu;
pub mod stock_movement;
pub mod user;
