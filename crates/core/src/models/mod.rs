//! Domain models as the store API sends and accepts them.
//!
//! Records use the API's JSON shape: camelCase keys and a `_id` string
//! identifier. Fields the API may omit default to empty values so one
//! sparse record does not fail a whole list.

mod order;
mod product;
mod user;
pub(crate) mod wire;

pub use order::{
    NewOrder, NewOrderCustomer, NewOrderItem, Order, OrderCustomer, OrderItem, PaymentInfo,
    ShippingInfo,
};
pub use product::{NewProduct, Product, ProductPatch, ProductUpdate, PRODUCT_CATEGORIES};
pub use user::{Address, AdminIdentity, ProfileUpdate, UserProfile};
