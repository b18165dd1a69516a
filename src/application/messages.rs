//! Response message catalog.
//!
//! The upstream deployment resolves user-facing strings through a
//! localization service; this catalog is the fixed-interface seam standing
//! in for it. Unknown keys resolve to themselves so a missing entry is
//! visible in responses instead of panicking.

use std::collections::HashMap;

use once_cell::sync::Lazy;

static DEFAULT_MESSAGES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("sale.list.success", "Sales retrieved successfully."),
        ("sale.create.success", "Sale created successfully."),
        ("sale.detail.success", "Sale details retrieved successfully."),
        ("customer.list.success", "Customers retrieved successfully."),
        ("customer.create.success", "Customer created successfully."),
        (
            "customer.detail.success",
            "Customer details retrieved successfully.",
        ),
        ("customer.update.success", "Customer updated successfully."),
        ("customer.delete.success", "Customer deleted successfully."),
        ("product.list.success", "Products retrieved successfully."),
        ("product.create.success", "Product created successfully."),
        (
            "product.detail.success",
            "Product details retrieved successfully.",
        ),
        ("product.update.success", "Product updated successfully."),
        ("product.delete.success", "Product deleted successfully."),
    ])
});

#[derive(Debug, Clone, Default)]
pub struct MessageCatalog {
    overrides: HashMap<String, String>,
}

impl MessageCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace a default message, e.g. from a deployment's locale file.
    pub fn with_override(mut self, key: impl Into<String>, message: impl Into<String>) -> Self {
        self.overrides.insert(key.into(), message.into());
        self
    }

    pub fn resolve<'a>(&'a self, key: &'a str) -> &'a str {
        if let Some(message) = self.overrides.get(key) {
            return message;
        }
        DEFAULT_MESSAGES.get(key).copied().unwrap_or(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_defaults() {
        let catalog = MessageCatalog::new();
        assert_eq!(
            catalog.resolve("sale.create.success"),
            "Sale created successfully."
        );
    }

    #[test]
    fn overrides_win() {
        let catalog =
            MessageCatalog::new().with_override("sale.create.success", "Venda criada com sucesso.");
        assert_eq!(
            catalog.resolve("sale.create.success"),
            "Venda criada com sucesso."
        );
        assert_eq!(
            catalog.resolve("sale.list.success"),
            "Sales retrieved successfully."
        );
    }

    #[test]
    fn unknown_keys_resolve_to_themselves() {
        let catalog = MessageCatalog::new();
        assert_eq!(catalog.resolve("sale.refund.success"), "sale.refund.success");
    }
}
