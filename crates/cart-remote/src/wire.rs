//! Wire shapes for the cart REST API

use serde::{Deserialize, Deserializer, de};
use serde_json::Value;

use cart_sync::FetchedCart;
use nosh_core::{CartItem, CartItemId, CartTotals, FoodId};

/// `GET customer/cart/` response body
#[derive(Debug, Deserialize)]
pub struct CartPayload {
    #[serde(default)]
    pub items: Vec<CartItemPayload>,
    #[serde(default, deserialize_with = "de_opt_price")]
    pub subtotal: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_price")]
    pub delivery_fee: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_price")]
    pub total: Option<f64>,
}

/// One cart line with nested food info
#[derive(Debug, Deserialize)]
pub struct CartItemPayload {
    pub id: u64,
    pub food: FoodPayload,
    /// Chosen variant labels, e.g. sizes; absent for plain items
    #[serde(default)]
    pub variants: Vec<String>,
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
pub struct FoodPayload {
    pub id: u64,
    pub name: String,
    #[serde(deserialize_with = "de_price")]
    pub price: f64,
}

impl CartPayload {
    /// Map the wire shape onto the engine's model
    pub fn into_fetched(self) -> FetchedCart {
        let totals = match (self.subtotal, self.delivery_fee, self.total) {
            (None, None, None) => None,
            (subtotal, delivery_fee, total) => Some(CartTotals {
                subtotal: subtotal.unwrap_or(0.0),
                delivery_fee: delivery_fee.unwrap_or(0.0),
                total: total.unwrap_or(0.0),
            }),
        };

        let items = self
            .items
            .into_iter()
            .map(CartItemPayload::into_item)
            .collect();

        FetchedCart { items, totals }
    }
}

impl CartItemPayload {
    fn into_item(self) -> CartItem {
        let variant_label = if self.variants.is_empty() {
            "Regular".to_string()
        } else {
            self.variants.join(", ")
        };

        CartItem {
            id: CartItemId(self.id),
            food_id: FoodId(self.food.id),
            name: self.food.name,
            unit_price: self.food.price,
            variant_label,
            quantity: self.quantity.max(1),
        }
    }
}

/// The backend serializes decimals as strings ("640.00"); accept both
/// numbers and numeric strings.
fn de_price<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| de::Error::custom("price out of range")),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("invalid price string: {s:?}"))),
        other => Err(de::Error::custom(format!(
            "expected price number or string, got {other}"
        ))),
    }
}

fn de_opt_price<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_f64()
            .map(Some)
            .ok_or_else(|| de::Error::custom("price out of range")),
        Some(Value::String(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("invalid price string: {s:?}"))),
        Some(other) => Err(de::Error::custom(format!(
            "expected price number or string, got {other}"
        ))),
    }
}
