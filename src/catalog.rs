use dashmap::DashMap;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::vendor::Product;

/// Product lookup used at checkout to validate vendor ownership and snapshot
/// prices. Variants point at a parent product belonging to the same vendor.
#[derive(Default)]
pub struct Catalog {
    products: DashMap<Uuid, Product>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, product: Product) {
        self.products.insert(product.id, product);
    }

    pub fn get_product(&self, id: Uuid) -> Result<Product, AppError> {
        self.products
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or(AppError::ProductNotFound(id))
    }

    /// Resolves the vendor a product ultimately belongs to, walking one level
    /// of variant parentage.
    pub fn vendor_of(&self, product: &Product) -> Result<Uuid, AppError> {
        match product.parent_id {
            Some(parent_id) => Ok(self.get_product(parent_id)?.vendor_id),
            None => Ok(product.vendor_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: u128, vendor: u128, parent: Option<u128>) -> Product {
        Product {
            id: Uuid::from_u128(id),
            vendor_id: Uuid::from_u128(vendor),
            name: "jollof rice".to_string(),
            price_kobo: 250_000,
            parent_id: parent.map(Uuid::from_u128),
        }
    }

    #[test]
    fn missing_product_is_an_error() {
        let catalog = Catalog::new();
        assert!(catalog.get_product(Uuid::from_u128(9)).is_err());
    }

    #[test]
    fn variant_resolves_to_parent_vendor() {
        let catalog = Catalog::new();
        catalog.insert(product(1, 10, None));
        catalog.insert(product(2, 99, Some(1)));

        let variant = catalog.get_product(Uuid::from_u128(2)).unwrap();
        assert_eq!(catalog.vendor_of(&variant).unwrap(), Uuid::from_u128(10));
    }
}
