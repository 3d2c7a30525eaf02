//! List-page table definitions.
//!
//! A [`DataTableConfig`] names a table's columns (and which of them sort),
//! the select filters above it, and what an empty result says.

use storedesk_core::listing::ProductSort;
use storedesk_core::{DeliveryStatus, PRODUCT_CATEGORIES, UserRole};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableColumn {
    /// Sort key for sortable columns.
    pub key: &'static str,
    pub label: &'static str,
    pub sortable: bool,
}

impl TableColumn {
    #[must_use]
    pub const fn plain(key: &'static str, label: &'static str) -> Self {
        Self {
            key,
            label,
            sortable: false,
        }
    }

    #[must_use]
    pub const fn sortable(key: &'static str, label: &'static str) -> Self {
        Self {
            key,
            label,
            sortable: true,
        }
    }
}

/// One `<option>` of a filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOption {
    pub value: String,
    pub label: String,
}

impl FilterOption {
    #[must_use]
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// A select filter bound to a query parameter. The first option, "All",
/// has an empty value and clears the filter.
#[derive(Debug, Clone)]
pub struct TableFilter {
    pub key: &'static str,
    pub label: &'static str,
    pub options: Vec<FilterOption>,
}

impl TableFilter {
    #[must_use]
    pub fn select(
        key: &'static str,
        label: &'static str,
        options: impl IntoIterator<Item = FilterOption>,
    ) -> Self {
        Self {
            key,
            label,
            options: std::iter::once(FilterOption::new("", "All"))
                .chain(options)
                .collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DataTableConfig {
    /// DOM id of the `<table>`.
    pub table_id: &'static str,
    pub columns: Vec<TableColumn>,
    pub filters: Vec<TableFilter>,
    pub search_placeholder: &'static str,
    pub empty_title: &'static str,
    pub empty_description: Option<&'static str>,
}

impl DataTableConfig {
    #[must_use]
    pub fn new(table_id: &'static str, columns: Vec<TableColumn>) -> Self {
        Self {
            table_id,
            columns,
            filters: Vec::new(),
            search_placeholder: "Search...",
            empty_title: "No items found",
            empty_description: None,
        }
    }

    #[must_use]
    pub fn filter(mut self, filter: TableFilter) -> Self {
        self.filters.push(filter);
        self
    }

    #[must_use]
    pub fn search_placeholder(mut self, placeholder: &'static str) -> Self {
        self.search_placeholder = placeholder;
        self
    }

    #[must_use]
    pub fn empty_state(
        mut self,
        title: &'static str,
        description: Option<&'static str>,
    ) -> Self {
        self.empty_title = title;
        self.empty_description = description;
        self
    }

    /// For `colspan` on empty and expanded rows.
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }
}

const fn sort_label(sort: ProductSort) -> &'static str {
    match sort {
        ProductSort::Name => "Product",
        ProductSort::Brand => "Brand",
        ProductSort::Price => "Price",
        ProductSort::Stock => "Stock",
    }
}

#[must_use]
pub fn products_table_config() -> DataTableConfig {
    let mut columns = vec![TableColumn::plain("image", "Image")];
    columns.extend(
        ProductSort::ALL
            .into_iter()
            .map(|sort| TableColumn::sortable(sort.as_str(), sort_label(sort))),
    );
    columns.push(TableColumn::plain("category", "Category"));
    columns.push(TableColumn::plain("actions", "Actions"));

    DataTableConfig::new("products", columns)
        .filter(TableFilter::select(
            "category",
            "Category",
            PRODUCT_CATEGORIES
                .iter()
                .map(|c| FilterOption::new(*c, *c)),
        ))
        .search_placeholder("Search by name, brand, SKU or category...")
        .empty_state("No products found", Some("Try adjusting your search or filters"))
}

#[must_use]
pub fn orders_table_config() -> DataTableConfig {
    let columns = [
        ("customer", "Customer"),
        ("date", "Date"),
        ("items", "Items"),
        ("total", "Total"),
        ("payment", "Payment"),
        ("delivery", "Delivery"),
        ("actions", "Actions"),
    ]
    .into_iter()
    .map(|(key, label)| TableColumn::plain(key, label))
    .collect();

    DataTableConfig::new("orders", columns)
        .filter(TableFilter::select(
            "status",
            "Delivery status",
            DeliveryStatus::ALL
                .iter()
                .map(|s| FilterOption::new(s.as_str(), s.as_str())),
        ))
        .search_placeholder("Search by customer name or email...")
        .empty_state("No orders found", Some("Try a different status or search"))
}

#[must_use]
pub fn users_table_config() -> DataTableConfig {
    let columns = [
        ("name", "Name"),
        ("email", "Email"),
        ("phone", "Phone"),
        ("role", "Role"),
        ("joined", "Joined"),
        ("actions", "Actions"),
    ]
    .into_iter()
    .map(|(key, label)| TableColumn::plain(key, label))
    .collect();

    DataTableConfig::new("users", columns)
        .filter(TableFilter::select(
            "role",
            "Role",
            [
                FilterOption::new(UserRole::Admin.as_str(), "Admin"),
                FilterOption::new(UserRole::User.as_str(), "Customer"),
            ],
        ))
        .search_placeholder("Search by name, email or phone...")
        .empty_state("No users found", None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_products_table_sorts_by_known_keys() {
        let config = products_table_config();
        let sortable: Vec<&str> = config
            .columns
            .iter()
            .filter(|c| c.sortable)
            .map(|c| c.key)
            .collect();
        assert_eq!(sortable, ["name", "brand", "price", "stock"]);
        for key in sortable {
            assert!(key.parse::<ProductSort>().is_ok());
        }
    }

    #[test]
    fn test_select_filters_start_with_all() {
        let config = orders_table_config();
        let values: Vec<&str> = config
            .filters
            .iter()
            .flat_map(|f| f.options.iter().map(|o| o.value.as_str()))
            .collect();
        assert_eq!(values, ["", "Pending", "Shipped", "Delivered"]);
    }

    #[test]
    fn test_column_count_matches_columns() {
        assert_eq!(users_table_config().column_count(), 6);
        assert_eq!(orders_table_config().column_count(), 7);
        assert_eq!(products_table_config().column_count(), 7);
    }
}
