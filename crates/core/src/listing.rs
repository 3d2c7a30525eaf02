//! Search, filtering, sorting and pagination over cached lists.
//!
//! The store API returns whole collections, so every table in the
//! dashboard narrows and pages its rows locally.

use serde::{Deserialize, Serialize};

use crate::models::{Order, Product, UserProfile};
use crate::types::{DeliveryStatus, UserRole};

/// Query-string parameters shared by list pages.
///
/// Empty strings are treated as absent, since HTML forms submit empty
/// inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ListQuery {
    pub search: Option<String>,
    pub status: Option<String>,
    pub category: Option<String>,
    pub role: Option<String>,
    pub sort: Option<String>,
    pub dir: Option<String>,
    pub page: Option<usize>,
}

impl ListQuery {
    /// Trimmed search term, if any.
    #[must_use]
    pub fn search_term(&self) -> Option<&str> {
        non_empty(self.search.as_deref())
    }

    /// Delivery status filter; unknown values mean "all".
    #[must_use]
    pub fn delivery_status(&self) -> Option<DeliveryStatus> {
        non_empty(self.status.as_deref()).and_then(|s| s.parse().ok())
    }

    #[must_use]
    pub fn category_filter(&self) -> Option<&str> {
        non_empty(self.category.as_deref())
    }

    #[must_use]
    pub fn role_filter(&self) -> Option<UserRole> {
        non_empty(self.role.as_deref()).and_then(|s| s.parse().ok())
    }

    #[must_use]
    pub fn sort_key(&self) -> ProductSort {
        non_empty(self.sort.as_deref())
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn direction(&self) -> SortDirection {
        match non_empty(self.dir.as_deref()) {
            Some(d) if d.eq_ignore_ascii_case("desc") => SortDirection::Desc,
            _ => SortDirection::Asc,
        }
    }

    /// Requested page, 1 when absent.
    #[must_use]
    pub fn page(&self) -> usize {
        self.page.unwrap_or(1)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn contains(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

/// Case-insensitive text search over a record's searchable fields.
pub trait Searchable {
    /// Whether any searchable field contains `term`, ignoring case.
    fn matches(&self, term: &str) -> bool;
}

impl Searchable for Order {
    fn matches(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        self.customer.as_ref().is_some_and(|c| {
            c.name.as_deref().is_some_and(|n| contains(n, &term))
                || c.email.as_deref().is_some_and(|e| contains(e, &term))
        })
    }
}

impl Searchable for Product {
    fn matches(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        contains(&self.name, &term)
            || contains(&self.brand, &term)
            || self.sku.as_deref().is_some_and(|s| contains(s, &term))
            || self.category.iter().any(|c| contains(c, &term))
    }
}

impl Searchable for UserProfile {
    fn matches(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        contains(&self.name, &term)
            || contains(&self.email, &term)
            || self.phone.as_deref().is_some_and(|p| contains(p, &term))
    }
}

/// Orders matching an optional delivery status and search term, in input
/// order.
#[must_use]
pub fn filter_orders<'a>(
    orders: &'a [Order],
    status: Option<DeliveryStatus>,
    search: Option<&str>,
) -> Vec<&'a Order> {
    orders
        .iter()
        .filter(|o| status.is_none_or(|s| o.delivery_status == s))
        .filter(|o| search.is_none_or(|term| o.matches(term)))
        .collect()
}

/// Products matching an optional category (exact, case-insensitive) and
/// search term.
#[must_use]
pub fn filter_products<'a>(
    products: &'a [Product],
    category: Option<&str>,
    search: Option<&str>,
) -> Vec<&'a Product> {
    products
        .iter()
        .filter(|p| {
            category.is_none_or(|wanted| p.category.iter().any(|c| c.eq_ignore_ascii_case(wanted)))
        })
        .filter(|p| search.is_none_or(|term| p.matches(term)))
        .collect()
}

/// Users matching an optional role and search term.
#[must_use]
pub fn filter_users<'a>(
    users: &'a [UserProfile],
    role: Option<UserRole>,
    search: Option<&str>,
) -> Vec<&'a UserProfile> {
    users
        .iter()
        .filter(|u| role.is_none_or(|r| u.role == r))
        .filter(|u| search.is_none_or(|term| u.matches(term)))
        .collect()
}

/// Product table sort column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    #[default]
    Name,
    Brand,
    Price,
    Stock,
}

impl ProductSort {
    pub const ALL: [Self; 4] = [Self::Name, Self::Brand, Self::Price, Self::Stock];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Brand => "brand",
            Self::Price => "price",
            Self::Stock => "stock",
        }
    }
}

impl std::str::FromStr for ProductSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "name" => Ok(Self::Name),
            "brand" => Ok(Self::Brand),
            "price" => Ok(Self::Price),
            "stock" | "count_in_stock" => Ok(Self::Stock),
            _ => Err(format!("invalid sort key: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    /// The opposite direction, for column header links.
    #[must_use]
    pub const fn reversed(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

/// Sort products in place. Ties keep their input order.
pub fn sort_products(products: &mut [&Product], key: ProductSort, direction: SortDirection) {
    products.sort_by(|a, b| {
        let ordering = match key {
            ProductSort::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            ProductSort::Brand => a.brand.to_lowercase().cmp(&b.brand.to_lowercase()),
            ProductSort::Price => a.price.cmp(&b.price),
            ProductSort::Stock => a.count_in_stock.cmp(&b.count_in_stock),
        };
        match direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
}

/// One page of a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Current page, 1-based and always within `1..=total_pages`.
    pub page: usize,
    pub per_page: usize,
    /// Never less than 1, even for an empty list.
    pub total_pages: usize,
    pub total_items: usize,
}

impl<T> Page<T> {
    #[must_use]
    pub const fn has_prev(&self) -> bool {
        self.page > 1
    }

    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    #[must_use]
    pub const fn prev_page(&self) -> usize {
        if self.page > 1 { self.page - 1 } else { 1 }
    }

    #[must_use]
    pub const fn next_page(&self) -> usize {
        if self.page < self.total_pages {
            self.page + 1
        } else {
            self.total_pages
        }
    }

    /// 1-based index of the first item on this page (0 when empty).
    #[must_use]
    pub const fn first_index(&self) -> usize {
        if self.total_items == 0 {
            0
        } else {
            (self.page - 1) * self.per_page + 1
        }
    }

    /// 1-based index of the last item on this page.
    #[must_use]
    pub const fn last_index(&self) -> usize {
        if self.total_items == 0 {
            0
        } else {
            self.first_index() + self.items.len() - 1
        }
    }

    /// Page numbers for the pager.
    #[must_use]
    pub fn page_numbers(&self) -> Vec<usize> {
        (1..=self.total_pages).collect()
    }
}

/// Slice `items` into the requested page.
///
/// `total_pages = ceil(len / per_page)`, at least 1. The requested page is
/// clamped into `1..=total_pages`. A `per_page` of 0 is treated as 1.
#[must_use]
pub fn paginate<T>(items: Vec<T>, page: usize, per_page: usize) -> Page<T> {
    let per_page = per_page.max(1);
    let total_items = items.len();
    let total_pages = total_items.div_ceil(per_page).max(1);
    let page = page.clamp(1, total_pages);
    let items = items
        .into_iter()
        .skip((page - 1) * per_page)
        .take(per_page)
        .collect();

    Page {
        items,
        page,
        per_page,
        total_pages,
        total_items,
    }
}
