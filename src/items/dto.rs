use serde::{Deserialize, Serialize};

use super::error::ItemError;
use super::repo_types::{ItemChanges, NewItem};

pub const MIN_NAME_LEN: usize = 2;
pub const MIN_PRICE: i32 = 1;
pub const MAX_PRICE: i32 = 999_999;

#[derive(Debug, Deserialize)]
pub struct CreateItemRequest {
    pub name: String,
    pub price: i32,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateItemRequest {
    pub name: Option<String>,
    pub price: Option<i32>,
    pub description: Option<String>,
    pub sold_out: Option<bool>,
}

/// Every item response is wrapped as `{"data": ...}`.
#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub data: T,
}

fn check_name(name: &str) -> Result<String, ItemError> {
    let name = name.trim();
    if name.chars().count() < MIN_NAME_LEN {
        return Err(ItemError::Validation(format!(
            "name must be at least {} characters",
            MIN_NAME_LEN
        )));
    }
    Ok(name.to_string())
}

fn check_price(price: i32) -> Result<i32, ItemError> {
    if !(MIN_PRICE..=MAX_PRICE).contains(&price) {
        return Err(ItemError::Validation(format!(
            "price must be between {} and {}",
            MIN_PRICE, MAX_PRICE
        )));
    }
    Ok(price)
}

impl TryFrom<CreateItemRequest> for NewItem {
    type Error = ItemError;

    fn try_from(req: CreateItemRequest) -> Result<Self, Self::Error> {
        Ok(NewItem {
            name: check_name(&req.name)?,
            price: check_price(req.price)?,
            description: req.description,
        })
    }
}

impl TryFrom<UpdateItemRequest> for ItemChanges {
    type Error = ItemError;

    fn try_from(req: UpdateItemRequest) -> Result<Self, Self::Error> {
        Ok(ItemChanges {
            name: req.name.as_deref().map(check_name).transpose()?,
            price: req.price.map(check_price).transpose()?,
            description: req.description,
            sold_out: req.sold_out,
        })
    }
}
