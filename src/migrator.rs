use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240601_000001_create_companies_table::Migration),
            Box::new(m20240601_000002_create_users_table::Migration),
            Box::new(m20240601_000003_create_location_tables::Migration),
            Box::new(m20240601_000004_create_category_tables::Migration),
            Box::new(m20240601_000005_create_ingredients_table::Migration),
            Box::new(m20240601_000006_create_preparation_tables::Migration),
            Box::new(m20240601_000007_create_stock_level_tables::Migration),
            Box::new(m20240601_000008_create_perishables_table::Migration),
            Box::new(m20240601_000009_create_stock_movements_table::Migration),
            Box::new(m20240601_000010_create_losses_table::Migration),
            Box::new(m20240601_000011_create_dining_tables_table::Migration),
            Box::new(m20240601_000012_create_menu_tables::Migration),
            Box::new(m20240601_000013_create_order_tables::Migration),
            Box::new(m20240601_000014_create_order_histories_table::Migration),
            Box::new(m20240601_000015_create_company_business_hours_table::Migration),
        ]
    }
}

// Migration implementations

mod m20240601_000001_create_companies_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000001_create_companies_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Companies::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Companies::Id)
                                .integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Companies::Name).string().not_null())
                        .col(
                            ColumnDef::new(Companies::PublicMenuCardUrl)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(Companies::ShowMenuImages)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Companies::ShowOutOfStockMenusOnCard)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Companies::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Companies::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Companies::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Companies {
        Table,
        Id,
        Name,
        PublicMenuCardUrl,
        ShowMenuImages,
        ShowOutOfStockMenusOnCard,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240601_000002_create_users_table {
    use super::m20240601_000001_create_companies_table::Companies;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000002_create_users_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Users::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Users::Id)
                                .integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Users::CompanyId).integer().not_null())
                        .col(ColumnDef::new(Users::Name).string().not_null())
                        .col(ColumnDef::new(Users::Email).string().not_null().unique_key())
                        .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                        .col(
                            ColumnDef::new(Users::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Users::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_users_company_id")
                                .from(Users::Table, Users::CompanyId)
                                .to(Companies::Table, Companies::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_users_company_id")
                        .table(Users::Table)
                        .col(Users::CompanyId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Users::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Users {
        Table,
        Id,
        CompanyId,
        Name,
        Email,
        PasswordHash,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240601_000003_create_location_tables {
    use super::m20240601_000001_create_companies_table::Companies;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000003_create_location_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(LocationTypes::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(LocationTypes::Id)
                                .integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(ColumnDef::new(LocationTypes::CompanyId).integer().not_null())
                        .col(ColumnDef::new(LocationTypes::Name).string().not_null())
                        .col(
                            ColumnDef::new(LocationTypes::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(LocationTypes::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_location_types_company_id")
                                .from(LocationTypes::Table, LocationTypes::CompanyId)
                                .to(Companies::Table, Companies::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Locations::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Locations::Id)
                                .integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Locations::CompanyId).integer().not_null())
                        .col(
                            ColumnDef::new(Locations::LocationTypeId)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Locations::Name).string().not_null())
                        .col(
                            ColumnDef::new(Locations::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Locations::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_locations_company_id")
                                .from(Locations::Table, Locations::CompanyId)
                                .to(Companies::Table, Companies::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_locations_location_type_id")
                                .from(Locations::Table, Locations::LocationTypeId)
                                .to(LocationTypes::Table, LocationTypes::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_locations_company_id")
                        .table(Locations::Table)
                        .col(Locations::CompanyId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Locations::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(LocationTypes::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum LocationTypes {
        Table,
        Id,
        CompanyId,
        Name,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum Locations {
        Table,
        Id,
        CompanyId,
        LocationTypeId,
        Name,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240601_000004_create_category_tables {
    use super::m20240601_000001_create_companies_table::Companies;
    use super::m20240601_000003_create_location_tables::LocationTypes;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000004_create_category_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Categories::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Categories::Id)
                                .integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Categories::CompanyId).integer().not_null())
                        .col(ColumnDef::new(Categories::Name).string().not_null())
                        .col(
                            ColumnDef::new(Categories::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Categories::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_categories_company_id")
                                .from(Categories::Table, Categories::CompanyId)
                                .to(Companies::Table, Companies::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            // Shelf-life rules: hours a perishable of a category keeps at a
            // location type. One rule per (category, location type) pair.
            manager
                .create_table(
                    Table::create()
                        .table(CategoryLocationTypes::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(CategoryLocationTypes::Id)
                                .integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(CategoryLocationTypes::CategoryId)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(CategoryLocationTypes::LocationTypeId)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(CategoryLocationTypes::ShelfLifeHours)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(CategoryLocationTypes::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(CategoryLocationTypes::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_category_location_types_category_id")
                                .from(
                                    CategoryLocationTypes::Table,
                                    CategoryLocationTypes::CategoryId,
                                )
                                .to(Categories::Table, Categories::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_category_location_types_location_type_id")
                                .from(
                                    CategoryLocationTypes::Table,
                                    CategoryLocationTypes::LocationTypeId,
                                )
                                .to(LocationTypes::Table, LocationTypes::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .unique()
                        .name("ux_category_location_types_pair")
                        .table(CategoryLocationTypes::Table)
                        .col(CategoryLocationTypes::CategoryId)
                        .col(CategoryLocationTypes::LocationTypeId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(CategoryLocationTypes::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Categories::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Categories {
        Table,
        Id,
        CompanyId,
        Name,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum CategoryLocationTypes {
        Table,
        Id,
        CategoryId,
        LocationTypeId,
        ShelfLifeHours,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240601_000005_create_ingredients_table {
    use super::m20240601_000001_create_companies_table::Companies;
    use super::m20240601_000004_create_category_tables::Categories;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000005_create_ingredients_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Ingredients::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Ingredients::Id)
                                .integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Ingredients::CompanyId).integer().not_null())
                        .col(ColumnDef::new(Ingredients::Name).string().not_null())
                        .col(ColumnDef::new(Ingredients::Unit).string().not_null())
                        .col(ColumnDef::new(Ingredients::CategoryId).integer().null())
                        .col(
                            ColumnDef::new(Ingredients::Threshold)
                                .decimal_len(12, 2)
                                .null(),
                        )
                        .col(ColumnDef::new(Ingredients::Barcode).string().null())
                        .col(ColumnDef::new(Ingredients::ImageUrl).string().null())
                        .col(ColumnDef::new(Ingredients::Allergens).json().not_null())
                        .col(
                            ColumnDef::new(Ingredients::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Ingredients::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_ingredients_company_id")
                                .from(Ingredients::Table, Ingredients::CompanyId)
                                .to(Companies::Table, Companies::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_ingredients_category_id")
                                .from(Ingredients::Table, Ingredients::CategoryId)
                                .to(Categories::Table, Categories::Id)
                                .on_delete(ForeignKeyAction::SetNull)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_ingredients_company_id")
                        .table(Ingredients::Table)
                        .col(Ingredients::CompanyId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_ingredients_barcode")
                        .table(Ingredients::Table)
                        .col(Ingredients::Barcode)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Ingredients::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Ingredients {
        Table,
        Id,
        CompanyId,
        Name,
        Unit,
        CategoryId,
        Threshold,
        Barcode,
        ImageUrl,
        Allergens,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240601_000006_create_preparation_tables {
    use super::m20240601_000001_create_companies_table::Companies;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000006_create_preparation_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Preparations::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Preparations::Id)
                                .integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Preparations::CompanyId).integer().not_null())
                        .col(ColumnDef::new(Preparations::Name).string().not_null())
                        .col(ColumnDef::new(Preparations::Unit).string().not_null())
                        .col(ColumnDef::new(Preparations::Kind).string().not_null())
                        .col(ColumnDef::new(Preparations::ImageUrl).string().null())
                        .col(
                            ColumnDef::new(Preparations::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Preparations::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_preparations_company_id")
                                .from(Preparations::Table, Preparations::CompanyId)
                                .to(Companies::Table, Companies::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(PreparationComponents::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PreparationComponents::Id)
                                .integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PreparationComponents::PreparationId)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PreparationComponents::ComponentKind)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PreparationComponents::ComponentId)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PreparationComponents::Quantity)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PreparationComponents::Unit)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PreparationComponents::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PreparationComponents::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_preparation_components_preparation_id")
                                .from(
                                    PreparationComponents::Table,
                                    PreparationComponents::PreparationId,
                                )
                                .to(Preparations::Table, Preparations::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_preparation_components_preparation_id")
                        .table(PreparationComponents::Table)
                        .col(PreparationComponents::PreparationId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(PreparationComponents::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Preparations::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Preparations {
        Table,
        Id,
        CompanyId,
        Name,
        Unit,
        Kind,
        ImageUrl,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum PreparationComponents {
        Table,
        Id,
        PreparationId,
        ComponentKind,
        ComponentId,
        Quantity,
        Unit,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240601_000007_create_stock_level_tables {
    use super::m20240601_000003_create_location_tables::Locations;
    use super::m20240601_000005_create_ingredients_table::Ingredients;
    use super::m20240601_000006_create_preparation_tables::Preparations;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000007_create_stock_level_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(IngredientLocations::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(IngredientLocations::Id)
                                .integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(IngredientLocations::IngredientId)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(IngredientLocations::LocationId)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(IngredientLocations::Quantity)
                                .decimal_len(12, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(IngredientLocations::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(IngredientLocations::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_ingredient_locations_ingredient_id")
                                .from(
                                    IngredientLocations::Table,
                                    IngredientLocations::IngredientId,
                                )
                                .to(Ingredients::Table, Ingredients::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_ingredient_locations_location_id")
                                .from(IngredientLocations::Table, IngredientLocations::LocationId)
                                .to(Locations::Table, Locations::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .unique()
                        .name("ux_ingredient_locations_pair")
                        .table(IngredientLocations::Table)
                        .col(IngredientLocations::IngredientId)
                        .col(IngredientLocations::LocationId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(PreparationLocations::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PreparationLocations::Id)
                                .integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PreparationLocations::PreparationId)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PreparationLocations::LocationId)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PreparationLocations::Quantity)
                                .decimal_len(12, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(PreparationLocations::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PreparationLocations::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_preparation_locations_preparation_id")
                                .from(
                                    PreparationLocations::Table,
                                    PreparationLocations::PreparationId,
                                )
                                .to(Preparations::Table, Preparations::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_preparation_locations_location_id")
                                .from(
                                    PreparationLocations::Table,
                                    PreparationLocations::LocationId,
                                )
                                .to(Locations::Table, Locations::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .unique()
                        .name("ux_preparation_locations_pair")
                        .table(PreparationLocations::Table)
                        .col(PreparationLocations::PreparationId)
                        .col(PreparationLocations::LocationId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(PreparationLocations::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(IngredientLocations::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum IngredientLocations {
        Table,
        Id,
        IngredientId,
        LocationId,
        Quantity,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum PreparationLocations {
        Table,
        Id,
        PreparationId,
        LocationId,
        Quantity,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240601_000008_create_perishables_table {
    use super::m20240601_000001_create_companies_table::Companies;
    use super::m20240601_000003_create_location_tables::Locations;
    use super::m20240601_000005_create_ingredients_table::Ingredients;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000008_create_perishables_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Perishables::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Perishables::Id)
                                .integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Perishables::CompanyId).integer().not_null())
                        .col(
                            ColumnDef::new(Perishables::IngredientId)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Perishables::LocationId).integer().not_null())
                        .col(
                            ColumnDef::new(Perishables::Quantity)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Perishables::IsRead)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Perishables::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Perishables::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Perishables::DeletedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_perishables_company_id")
                                .from(Perishables::Table, Perishables::CompanyId)
                                .to(Companies::Table, Companies::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_perishables_ingredient_id")
                                .from(Perishables::Table, Perishables::IngredientId)
                                .to(Ingredients::Table, Ingredients::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_perishables_location_id")
                                .from(Perishables::Table, Perishables::LocationId)
                                .to(Locations::Table, Locations::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            // FIFO consumption scans batches of one ingredient at one location
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_perishables_ingredient_location")
                        .table(Perishables::Table)
                        .col(Perishables::IngredientId)
                        .col(Perishables::LocationId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_perishables_created_at")
                        .table(Perishables::Table)
                        .col(Perishables::CreatedAt)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Perishables::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Perishables {
        Table,
        Id,
        CompanyId,
        IngredientId,
        LocationId,
        Quantity,
        IsRead,
        CreatedAt,
        UpdatedAt,
        DeletedAt,
    }
}

mod m20240601_000009_create_stock_movements_table {
    use super::m20240601_000001_create_companies_table::Companies;
    use super::m20240601_000002_create_users_table::Users;
    use super::m20240601_000003_create_location_tables::Locations;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000009_create_stock_movements_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(StockMovements::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockMovements::Id)
                                .integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockMovements::CompanyId)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockMovements::StockableKind)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockMovements::StockableId)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockMovements::LocationId)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockMovements::UserId).integer().null())
                        .col(
                            ColumnDef::new(StockMovements::MovementType)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockMovements::Quantity)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockMovements::QuantityBefore)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockMovements::QuantityAfter)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockMovements::Reason).string().null())
                        .col(
                            ColumnDef::new(StockMovements::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_stock_movements_company_id")
                                .from(StockMovements::Table, StockMovements::CompanyId)
                                .to(Companies::Table, Companies::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_stock_movements_location_id")
                                .from(StockMovements::Table, StockMovements::LocationId)
                                .to(Locations::Table, Locations::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_stock_movements_user_id")
                                .from(StockMovements::Table, StockMovements::UserId)
                                .to(Users::Table, Users::Id)
                                .on_delete(ForeignKeyAction::SetNull)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stock_movements_stockable")
                        .table(StockMovements::Table)
                        .col(StockMovements::StockableKind)
                        .col(StockMovements::StockableId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stock_movements_created_at")
                        .table(StockMovements::Table)
                        .col(StockMovements::CreatedAt)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(StockMovements::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum StockMovements {
        Table,
        Id,
        CompanyId,
        StockableKind,
        StockableId,
        LocationId,
        UserId,
        MovementType,
        Quantity,
        QuantityBefore,
        QuantityAfter,
        Reason,
        CreatedAt,
    }
}

mod m20240601_000010_create_losses_table {
    use super::m20240601_000001_create_companies_table::Companies;
    use super::m20240601_000002_create_users_table::Users;
    use super::m20240601_000003_create_location_tables::Locations;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000010_create_losses_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Losses::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Losses::Id)
                                .integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Losses::CompanyId).integer().not_null())
                        .col(ColumnDef::new(Losses::StockableKind).string().not_null())
                        .col(ColumnDef::new(Losses::StockableId).integer().not_null())
                        .col(ColumnDef::new(Losses::LocationId).integer().not_null())
                        .col(ColumnDef::new(Losses::UserId).integer().null())
                        .col(
                            ColumnDef::new(Losses::Quantity)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(ColumnDef::new(Losses::Reason).string().null())
                        .col(
                            ColumnDef::new(Losses::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Losses::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_losses_company_id")
                                .from(Losses::Table, Losses::CompanyId)
                                .to(Companies::Table, Companies::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_losses_location_id")
                                .from(Losses::Table, Losses::LocationId)
                                .to(Locations::Table, Locations::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_losses_user_id")
                                .from(Losses::Table, Losses::UserId)
                                .to(Users::Table, Users::Id)
                                .on_delete(ForeignKeyAction::SetNull)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_losses_stockable")
                        .table(Losses::Table)
                        .col(Losses::StockableKind)
                        .col(Losses::StockableId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Losses::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Losses {
        Table,
        Id,
        CompanyId,
        StockableKind,
        StockableId,
        LocationId,
        UserId,
        Quantity,
        Reason,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240601_000011_create_dining_tables_table {
    use super::m20240601_000001_create_companies_table::Companies;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000011_create_dining_tables_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(DiningTables::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(DiningTables::Id)
                                .integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(ColumnDef::new(DiningTables::CompanyId).integer().not_null())
                        .col(ColumnDef::new(DiningTables::Name).string().not_null())
                        .col(
                            ColumnDef::new(DiningTables::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DiningTables::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_dining_tables_company_id")
                                .from(DiningTables::Table, DiningTables::CompanyId)
                                .to(Companies::Table, Companies::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(DiningTables::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum DiningTables {
        Table,
        Id,
        CompanyId,
        Name,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240601_000012_create_menu_tables {
    use super::m20240601_000001_create_companies_table::Companies;
    use super::m20240601_000003_create_location_tables::Locations;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000012_create_menu_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Menus::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Menus::Id)
                                .integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Menus::CompanyId).integer().not_null())
                        .col(ColumnDef::new(Menus::Name).string().not_null())
                        .col(ColumnDef::new(Menus::Description).text().null())
                        .col(ColumnDef::new(Menus::Price).decimal_len(12, 2).not_null())
                        .col(ColumnDef::new(Menus::ServiceKind).string().not_null())
                        .col(
                            ColumnDef::new(Menus::IsReturnable)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(Menus::ImageUrl).string().null())
                        .col(
                            ColumnDef::new(Menus::PublicPriority)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Menus::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Menus::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_menus_company_id")
                                .from(Menus::Table, Menus::CompanyId)
                                .to(Companies::Table, Companies::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(MenuItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(MenuItems::Id)
                                .integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(ColumnDef::new(MenuItems::MenuId).integer().not_null())
                        .col(ColumnDef::new(MenuItems::StockableKind).string().not_null())
                        .col(ColumnDef::new(MenuItems::StockableId).integer().not_null())
                        .col(ColumnDef::new(MenuItems::LocationId).integer().not_null())
                        .col(
                            ColumnDef::new(MenuItems::Quantity)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(ColumnDef::new(MenuItems::Unit).string().not_null())
                        .col(
                            ColumnDef::new(MenuItems::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MenuItems::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_menu_items_menu_id")
                                .from(MenuItems::Table, MenuItems::MenuId)
                                .to(Menus::Table, Menus::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_menu_items_location_id")
                                .from(MenuItems::Table, MenuItems::LocationId)
                                .to(Locations::Table, Locations::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_menu_items_menu_id")
                        .table(MenuItems::Table)
                        .col(MenuItems::MenuId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(MenuItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Menus::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Menus {
        Table,
        Id,
        CompanyId,
        Name,
        Description,
        Price,
        ServiceKind,
        IsReturnable,
        ImageUrl,
        PublicPriority,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum MenuItems {
        Table,
        Id,
        MenuId,
        StockableKind,
        StockableId,
        LocationId,
        Quantity,
        Unit,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240601_000013_create_order_tables {
    use super::m20240601_000001_create_companies_table::Companies;
    use super::m20240601_000002_create_users_table::Users;
    use super::m20240601_000011_create_dining_tables_table::DiningTables;
    use super::m20240601_000012_create_menu_tables::Menus;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000013_create_order_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Orders::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Orders::Id)
                                .integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Orders::CompanyId).integer().not_null())
                        .col(ColumnDef::new(Orders::DiningTableId).integer().not_null())
                        .col(ColumnDef::new(Orders::UserId).integer().null())
                        .col(ColumnDef::new(Orders::Status).string().not_null())
                        .col(
                            ColumnDef::new(Orders::PendingAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Orders::ServedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Orders::PayedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Orders::CanceledAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Orders::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Orders::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_orders_company_id")
                                .from(Orders::Table, Orders::CompanyId)
                                .to(Companies::Table, Companies::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_orders_dining_table_id")
                                .from(Orders::Table, Orders::DiningTableId)
                                .to(DiningTables::Table, DiningTables::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_orders_user_id")
                                .from(Orders::Table, Orders::UserId)
                                .to(Users::Table, Users::Id)
                                .on_delete(ForeignKeyAction::SetNull)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_orders_company_id")
                        .table(Orders::Table)
                        .col(Orders::CompanyId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_orders_status")
                        .table(Orders::Table)
                        .col(Orders::Status)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(OrderSteps::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(OrderSteps::Id)
                                .integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(ColumnDef::new(OrderSteps::OrderId).integer().not_null())
                        .col(ColumnDef::new(OrderSteps::Position).integer().not_null())
                        .col(ColumnDef::new(OrderSteps::Status).string().not_null())
                        .col(
                            ColumnDef::new(OrderSteps::ServedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(OrderSteps::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(OrderSteps::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_order_steps_order_id")
                                .from(OrderSteps::Table, OrderSteps::OrderId)
                                .to(Orders::Table, Orders::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_order_steps_order_id")
                        .table(OrderSteps::Table)
                        .col(OrderSteps::OrderId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(StepMenus::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StepMenus::Id)
                                .integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StepMenus::OrderStepId).integer().not_null())
                        .col(ColumnDef::new(StepMenus::MenuId).integer().not_null())
                        .col(ColumnDef::new(StepMenus::Quantity).integer().not_null())
                        .col(ColumnDef::new(StepMenus::Status).string().not_null())
                        .col(ColumnDef::new(StepMenus::Note).text().null())
                        .col(
                            ColumnDef::new(StepMenus::ServedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(StepMenus::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StepMenus::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_step_menus_order_step_id")
                                .from(StepMenus::Table, StepMenus::OrderStepId)
                                .to(OrderSteps::Table, OrderSteps::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_step_menus_menu_id")
                                .from(StepMenus::Table, StepMenus::MenuId)
                                .to(Menus::Table, Menus::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_step_menus_order_step_id")
                        .table(StepMenus::Table)
                        .col(StepMenus::OrderStepId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(StepMenus::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(OrderSteps::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Orders::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Orders {
        Table,
        Id,
        CompanyId,
        DiningTableId,
        UserId,
        Status,
        PendingAt,
        ServedAt,
        PayedAt,
        CanceledAt,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum OrderSteps {
        Table,
        Id,
        OrderId,
        Position,
        Status,
        ServedAt,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum StepMenus {
        Table,
        Id,
        OrderStepId,
        MenuId,
        Quantity,
        Status,
        Note,
        ServedAt,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240601_000014_create_order_histories_table {
    use super::m20240601_000002_create_users_table::Users;
    use super::m20240601_000013_create_order_tables::Orders;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000014_create_order_histories_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(OrderHistories::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(OrderHistories::Id)
                                .integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(ColumnDef::new(OrderHistories::OrderId).integer().not_null())
                        .col(ColumnDef::new(OrderHistories::OrderStepId).integer().null())
                        .col(ColumnDef::new(OrderHistories::StepMenuId).integer().null())
                        .col(ColumnDef::new(OrderHistories::UserId).integer().null())
                        .col(ColumnDef::new(OrderHistories::Action).string().not_null())
                        .col(ColumnDef::new(OrderHistories::Reason).string().null())
                        .col(ColumnDef::new(OrderHistories::Payload).json().null())
                        .col(
                            ColumnDef::new(OrderHistories::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_order_histories_order_id")
                                .from(OrderHistories::Table, OrderHistories::OrderId)
                                .to(Orders::Table, Orders::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_order_histories_user_id")
                                .from(OrderHistories::Table, OrderHistories::UserId)
                                .to(Users::Table, Users::Id)
                                .on_delete(ForeignKeyAction::SetNull)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_order_histories_order_id")
                        .table(OrderHistories::Table)
                        .col(OrderHistories::OrderId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(OrderHistories::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum OrderHistories {
        Table,
        Id,
        OrderId,
        OrderStepId,
        StepMenuId,
        UserId,
        Action,
        Reason,
        Payload,
        CreatedAt,
    }
}

mod m20240601_000015_create_company_business_hours_table {
    use super::m20240601_000001_create_companies_table::Companies;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000015_create_company_business_hours_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(CompanyBusinessHours::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(CompanyBusinessHours::Id)
                                .integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(CompanyBusinessHours::CompanyId)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(CompanyBusinessHours::DayOfWeek)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(CompanyBusinessHours::OpensAt)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(CompanyBusinessHours::ClosesAt)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(CompanyBusinessHours::IsOvernight)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(CompanyBusinessHours::Sequence)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(CompanyBusinessHours::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(CompanyBusinessHours::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_company_business_hours_company_id")
                                .from(
                                    CompanyBusinessHours::Table,
                                    CompanyBusinessHours::CompanyId,
                                )
                                .to(Companies::Table, Companies::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_company_business_hours_company_id")
                        .table(CompanyBusinessHours::Table)
                        .col(CompanyBusinessHours::CompanyId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(CompanyBusinessHours::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum CompanyBusinessHours {
        Table,
        Id,
        CompanyId,
        DayOfWeek,
        OpensAt,
        ClosesAt,
        IsOvernight,
        Sequence,
        CreatedAt,
        UpdatedAt,
    }
}
