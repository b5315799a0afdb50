use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Brigade API",
        description = r#"
# Brigade Back-of-House API

Restaurant inventory and service backend: ingredients and preparations with
per-location stock, perishable batches with computed expirations, loss
accounting, menus with recipes, and the table-order workflow.

## Authentication

Every `/api/v1` endpoint except registration and login requires a JWT:

```
Authorization: Bearer <your-jwt-token>
```

Tokens are scoped to one restaurant; all reads and writes stay inside it.

## Public surfaces

The restaurant card (`/restaurant-card/{slug}`) and HMAC-signed image URLs
(`/public/images/{path}`) need no token.

## Pagination

List endpoints take `page` and `per_page` query parameters and wrap results
with a `pagination` object.
"#,
    ),
    paths(
        crate::handlers::auth::register,
        crate::handlers::auth::login,
        crate::handlers::auth::me,
        crate::handlers::auth::update_company,
        crate::handlers::auth::list_business_hours,
        crate::handlers::auth::update_business_hours,
        crate::handlers::ingredients::list_ingredients,
        crate::handlers::ingredients::create_ingredient,
        crate::handlers::ingredients::get_ingredient,
        crate::handlers::ingredients::update_ingredient,
        crate::handlers::ingredients::delete_ingredient,
        crate::handlers::ingredients::below_threshold,
        crate::handlers::ingredients::non_perishable,
        crate::handlers::ingredients::search_in_stock,
        crate::handlers::ingredients::product_by_barcode,
        crate::handlers::ingredients::product_search,
        crate::handlers::preparations::list_preparations,
        crate::handlers::preparations::create_preparation,
        crate::handlers::preparations::get_preparation,
        crate::handlers::preparations::update_preparation,
        crate::handlers::preparations::delete_preparation,
        crate::handlers::preparations::produce,
        crate::handlers::categories::list_categories,
        crate::handlers::categories::create_category,
        crate::handlers::categories::get_category,
        crate::handlers::categories::rename_category,
        crate::handlers::categories::delete_category,
        crate::handlers::categories::set_shelf_life,
        crate::handlers::categories::remove_shelf_life,
        crate::handlers::locations::list_locations,
        crate::handlers::locations::create_location,
        crate::handlers::locations::get_location,
        crate::handlers::locations::update_location,
        crate::handlers::locations::delete_location,
        crate::handlers::locations::list_location_types,
        crate::handlers::locations::create_location_type,
        crate::handlers::locations::rename_location_type,
        crate::handlers::locations::delete_location_type,
        crate::handlers::menus::list_menus,
        crate::handlers::menus::create_menu,
        crate::handlers::menus::get_menu,
        crate::handlers::menus::update_menu,
        crate::handlers::menus::delete_menu,
        crate::handlers::menus::stock_check,
        crate::handlers::dining_tables::list_tables,
        crate::handlers::dining_tables::create_table,
        crate::handlers::dining_tables::get_table,
        crate::handlers::dining_tables::rename_table,
        crate::handlers::dining_tables::delete_table,
        crate::handlers::orders::create_order,
        crate::handlers::orders::list_orders,
        crate::handlers::orders::order_stats,
        crate::handlers::orders::get_order,
        crate::handlers::orders::get_order_history,
        crate::handlers::orders::add_step,
        crate::handlers::orders::add_step_menu,
        crate::handlers::orders::mark_ready,
        crate::handlers::orders::mark_served,
        crate::handlers::orders::cancel_line,
        crate::handlers::orders::cancel_order,
        crate::handlers::orders::pay_order,
        crate::handlers::stock::add_stock,
        crate::handlers::stock::remove_stock,
        crate::handlers::stock::transfer_stock,
        crate::handlers::stock::stock_levels,
        crate::handlers::stock_movements::list_movements,
        crate::handlers::losses::list_losses,
        crate::handlers::losses::record_loss,
        crate::handlers::losses::rollback_loss,
        crate::handlers::perishables::list_perishables,
        crate::handlers::perishables::mark_read,
        crate::handlers::images::fetch_image,
        crate::handlers::images::sign_image,
        crate::handlers::images::serve_image,
        crate::handlers::restaurant_card::restaurant_card,
        crate::handlers::health::health,
    ),
    components(schemas(
        crate::errors::ErrorResponse,
        crate::handlers::health::HealthResponse,
        crate::entities::sea_orm_active_enums::MeasurementUnit,
        crate::entities::sea_orm_active_enums::StockableKind,
        crate::entities::sea_orm_active_enums::MovementType,
        crate::entities::sea_orm_active_enums::OrderStatus,
        crate::entities::sea_orm_active_enums::StepStatus,
        crate::entities::sea_orm_active_enums::StepMenuStatus,
        crate::entities::sea_orm_active_enums::MenuServiceKind,
        crate::entities::sea_orm_active_enums::PreparationKind,
        crate::entities::sea_orm_active_enums::Allergen,
    )),
    tags(
        (name = "auth", description = "Registration, login, and restaurant settings"),
        (name = "ingredients", description = "Ingredient catalog and stock insights"),
        (name = "products", description = "Open Food Facts lookups"),
        (name = "preparations", description = "House-made components and production"),
        (name = "categories", description = "Ingredient categories and shelf-life rules"),
        (name = "locations", description = "Storage locations and their types"),
        (name = "menus", description = "Menus, recipes, and stock checks"),
        (name = "dining-tables", description = "Front-of-house tables"),
        (name = "orders", description = "Table orders, courses, and service workflow"),
        (name = "stock", description = "Stock mutations, transfers, and movement history"),
        (name = "losses", description = "Loss accounting"),
        (name = "perishables", description = "Perishable batches and expirations"),
        (name = "images", description = "Stored images and signed URLs"),
        (name = "public", description = "Unauthenticated surfaces"),
        (name = "health", description = "Service health"),
    )
)]
pub struct ApiDoc;

/// Swagger UI router serving the generated document.
pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi())
}
