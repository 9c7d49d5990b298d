//! Initial schema: devices and the location samples they submit
//!
//! Foreign keys are declared inline with the table so the same migration
//! runs on SQLite, which cannot add constraints to an existing table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Devices::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Devices::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Devices::DeviceId)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Devices::Model).string().null())
                    .col(ColumnDef::new(Devices::OsVersion).string().null())
                    .col(
                        ColumnDef::new(Devices::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Devices::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
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
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Locations::DeviceRef).integer().not_null())
                    .col(ColumnDef::new(Locations::Latitude).double().not_null())
                    .col(ColumnDef::new(Locations::Longitude).double().not_null())
                    .col(ColumnDef::new(Locations::Accuracy).double().null())
                    .col(ColumnDef::new(Locations::Altitude).double().null())
                    .col(ColumnDef::new(Locations::Speed).double().null())
                    .col(ColumnDef::new(Locations::Heading).double().null())
                    .col(ColumnDef::new(Locations::BatteryLevel).double().null())
                    .col(ColumnDef::new(Locations::ActivityType).string().null())
                    .col(ColumnDef::new(Locations::Timestamp).string().not_null())
                    .col(
                        ColumnDef::new(Locations::ReceivedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_locations_device")
                            .from(Locations::Table, Locations::DeviceRef)
                            .to(Devices::Table, Devices::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Per-device history lookups
        manager
            .create_index(
                Index::create()
                    .name("idx_locations_device_ref")
                    .table(Locations::Table)
                    .col(Locations::DeviceRef)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Locations::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Devices::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Devices {
    Table,
    Id,
    DeviceId,
    Model,
    OsVersion,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Locations {
    Table,
    Id,
    DeviceRef,
    Latitude,
    Longitude,
    Accuracy,
    Altitude,
    Speed,
    Heading,
    BatteryLevel,
    ActivityType,
    Timestamp,
    ReceivedAt,
}
