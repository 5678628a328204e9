use chrono::{DateTime, Utc};
use diesel::{
    Selectable,
    prelude::{Identifiable, Insertable, Queryable},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// Buyers

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserEntity {
    pub id: i32,
    pub name: String,
    pub phone_number: String,
    pub verified: bool,
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Deserialize, Debug)]
#[diesel(table_name = crate::schema::users)]
pub struct CreateUserEntity {
    pub name: String,
    pub phone_number: String,
    pub verified: bool,
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
}

// Sellers

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::sellers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SellerEntity {
    pub id: i32,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    #[schema(ignore)]
    pub password_hash: String,
    pub shop_name: String,
    pub tax_id: String,
    pub payment_qr: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::sellers)]
pub struct CreateSellerEntity {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub shop_name: String,
    pub tax_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
}

// Admins

#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = crate::schema::admins)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AdminEntity {
    pub id: i32,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::admins)]
pub struct CreateAdminEntity {
    pub email: String,
    pub password_hash: String,
}

// Riders

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::riders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct RiderEntity {
    pub id: i32,
    pub name: String,
    pub phone_number: String,
    pub identity_picture: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::riders)]
pub struct CreateRiderEntity {
    pub name: String,
    pub phone_number: String,
    pub identity_picture: String,
}

// Products

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::products)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProductEntity {
    pub id: i32,
    pub seller_id: i32,
    pub name: String,
    pub description: String,
    pub price: f32,
    pub category: String,
    pub image: Option<String>,
    pub is_general: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::products)]
pub struct CreateProductEntity {
    pub seller_id: i32,
    pub name: String,
    pub description: String,
    pub price: f32,
    pub category: String,
    pub image: Option<String>,
    pub is_general: bool,
}

// Orders

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderEntity {
    pub id: i32,
    pub buyer_id: i32,
    pub seller_id: i32,
    pub status: String,
    pub delivery_stage: Option<String>,
    pub prescription: Option<String>,
    pub prescription_verified: bool,
    pub total_price: f32,
    pub delivery_charge: f32,
    pub platform_fee: f32,
    pub delivery_address: String,
    pub contact_name: String,
    pub contact_number: String,
    pub assigned_rider_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::orders)]
pub struct CreateOrderEntity {
    pub buyer_id: i32,
    pub seller_id: i32,
    pub status: String,
    pub prescription: Option<String>,
    pub prescription_verified: bool,
    pub total_price: f32,
    pub delivery_charge: f32,
    pub platform_fee: f32,
    pub delivery_address: String,
    pub contact_name: String,
    pub contact_number: String,
}

#[derive(Queryable, Selectable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::order_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderItemEntity {
    pub order_id: i32,
    pub product_id: i32,
    pub quantity: i32,
    pub unit_price: f32,
    pub requires_prescription: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::order_items)]
pub struct CreateOrderItemEntity {
    pub order_id: i32,
    pub product_id: i32,
    pub quantity: i32,
    pub unit_price: f32,
    pub requires_prescription: bool,
}
