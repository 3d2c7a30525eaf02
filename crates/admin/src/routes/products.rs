//! Product route handlers.
//!
//! The product table, the add/edit forms, the image manager and the delete
//! confirmation. Create and image replacement take multipart bodies so image
//! files can be forwarded to the store API.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Multipart, Path, Query, State, multipart::MultipartError},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use storedesk_core::listing::{
    ListQuery, SortDirection, filter_products, paginate, sort_products,
};
use storedesk_core::validation::{FieldErrors, ProductEditForm, ProductForm};
use storedesk_core::{CurrencyCode, PRODUCT_CATEGORIES, Product, ProductId};
use tower_sessions::Session;
use tracing::instrument;

use super::{Layout, Loaded, PageNav, load_or_toast, mutation_failed};
use crate::api::Upload;
use crate::components::data_table::{DataTableConfig, products_table_config};
use crate::filters;
use crate::flash::{self, Toast};
use crate::middleware::RequireAdminAuth;
use crate::models::CurrentAdmin;
use crate::state::AppState;
use crate::stores::StoreError;

// =============================================================================
// View Types
// =============================================================================

/// Product row in the table.
#[derive(Debug, Clone)]
pub struct ProductRow {
    pub id: String,
    pub name: String,
    pub brand: String,
    pub category: String,
    pub price: String,
    /// Discounted price, when a discount applies.
    pub sale_price: Option<String>,
    pub stock: i64,
    pub low_stock: bool,
    pub image: Option<String>,
}

impl ProductRow {
    fn new(product: &Product, currency: CurrencyCode, low_stock_threshold: i64) -> Self {
        let effective = product.effective_price();
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            brand: product.brand.clone(),
            category: product.category_label(),
            price: currency.format(product.price),
            sale_price: (effective != product.price).then(|| currency.format(effective)),
            stock: product.count_in_stock,
            low_stock: product.count_in_stock <= low_stock_threshold,
            image: product.primary_image().map(str::to_owned),
        }
    }
}

/// A table header cell; sortable columns link to their sort.
#[derive(Debug, Clone)]
pub struct ColumnHeader {
    pub label: String,
    pub href: Option<String>,
    /// `asc` or `desc` on the active sort column.
    pub direction: Option<&'static str>,
}

fn column_headers(table: &DataTableConfig, query: &ListQuery) -> Vec<ColumnHeader> {
    let active = query.sort_key();
    let direction = query.direction();
    table
        .columns
        .iter()
        .map(|column| {
            if !column.sortable {
                return ColumnHeader {
                    label: column.label.to_owned(),
                    href: None,
                    direction: None,
                };
            }
            let is_active = column.key == active.as_str();
            let next = if is_active {
                direction.reversed()
            } else {
                SortDirection::Asc
            };
            let linked = ListQuery {
                sort: Some(column.key.to_owned()),
                dir: Some(next.as_str().to_owned()),
                page: None,
                ..query.clone()
            };
            ColumnHeader {
                label: column.label.to_owned(),
                href: Some(super::list_href("/products", &linked, 1)),
                direction: is_active.then(|| direction.as_str()),
            }
        })
        .collect()
}

/// Form fields collected from a multipart body.
#[derive(Debug, Default)]
struct MultipartFields {
    fields: Vec<(String, String)>,
    uploads: Vec<Upload>,
}

impl MultipartFields {
    fn values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.fields
            .iter()
            .filter(move |(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    fn product_form(&self) -> ProductForm {
        let mut form = ProductForm::default();
        let mut categories = Vec::new();
        for (key, value) in &self.fields {
            match key.as_str() {
                "name" => form.name.clone_from(value),
                "brand" => form.brand.clone_from(value),
                "category" => categories.push(value.as_str()),
                "price" => form.price.clone_from(value),
                "discounted_price" => form.discounted_price.clone_from(value),
                "count_in_stock" => form.count_in_stock.clone_from(value),
                "size" => form.size.clone_from(value),
                "sku" => form.sku.clone_from(value),
                "target_audience" => form.target_audience.clone_from(value),
                "description" => form.description.clone_from(value),
                "is_featured" => form.is_featured = Some(value.clone()),
                "bestseller" => form.bestseller = Some(value.clone()),
                _ => {}
            }
        }
        form.category = categories.join(", ");
        form
    }
}

/// Read every part; empty file inputs are skipped.
async fn read_multipart(mut multipart: Multipart) -> Result<MultipartFields, MultipartError> {
    let mut collected = MultipartFields::default();
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_owned();
        if let Some(file_name) = field.file_name().map(str::to_owned) {
            let content_type = field.content_type().map(str::to_owned);
            let bytes = field.bytes().await?;
            if name != "images" || file_name.is_empty() || bytes.is_empty() {
                continue;
            }
            collected.uploads.push(Upload {
                file_name,
                content_type,
                bytes: bytes.to_vec(),
            });
        } else {
            let value = field.text().await?;
            collected.fields.push((name, value));
        }
    }
    Ok(collected)
}

/// Whether `category` is among the comma-separated `selected` values.
fn category_selected(selected: &str, category: &str) -> bool {
    selected
        .split(',')
        .any(|c| c.trim().eq_ignore_ascii_case(category))
}

// =============================================================================
// Templates
// =============================================================================

/// Product list page.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub layout: Layout,
    pub table: DataTableConfig,
    pub headers: Vec<ColumnHeader>,
    pub rows: Vec<ProductRow>,
    pub nav: PageNav,
    pub search_value: String,
    pub category_value: String,
}

impl ProductsIndexTemplate {
    fn filter_value(&self) -> &str {
        &self.category_value
    }
}

/// Add-product form.
#[derive(Template, WebTemplate)]
#[template(path = "products/new.html")]
pub struct ProductNewTemplate {
    pub layout: Layout,
    pub form: ProductForm,
    pub errors: FieldErrors,
    pub categories: &'static [&'static str],
    pub max_images: usize,
}

impl ProductNewTemplate {
    fn has_category(&self, category: &str) -> bool {
        category_selected(&self.form.category, category)
    }
}

/// Product detail page.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub layout: Layout,
    pub product: Product,
    pub row: ProductRow,
}

/// Edit-product form.
#[derive(Template, WebTemplate)]
#[template(path = "products/edit.html")]
pub struct ProductEditTemplate {
    pub layout: Layout,
    pub product_id: String,
    pub product_name: String,
    pub form: ProductEditForm,
    pub errors: FieldErrors,
    pub categories: &'static [&'static str],
}

/// Image manager.
#[derive(Template, WebTemplate)]
#[template(path = "products/images.html")]
pub struct ProductImagesTemplate {
    pub layout: Layout,
    pub product: Product,
    pub max_images: usize,
}

/// Delete confirmation.
#[derive(Template, WebTemplate)]
#[template(path = "products/delete.html")]
pub struct ProductDeleteTemplate {
    pub layout: Layout,
    pub product: Product,
}

// =============================================================================
// Handlers
// =============================================================================

/// Look up a product for a detail page, answering the failure if there is one.
async fn find_or_respond(
    state: &AppState,
    session: &Session,
    admin: &CurrentAdmin,
    id: &ProductId,
) -> Result<Product, Response> {
    match state.stores().products.find(&admin.token, id).await {
        Ok(product) => Ok(product),
        Err(e) => Err(mutation_failed(state, session, admin, &e, "Failed to fetch products", "/products").await),
    }
}

/// Re-render the add form with the submitted values.
async fn render_new_form(
    state: &AppState,
    session: &Session,
    admin: &CurrentAdmin,
    form: ProductForm,
    errors: FieldErrors,
) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        ProductNewTemplate {
            layout: Layout::new(state, session, admin, "/products").await,
            form,
            errors,
            categories: &PRODUCT_CATEGORIES,
            max_images: Product::MAX_IMAGES,
        },
    )
        .into_response()
}

/// Re-render the edit form with the submitted values.
async fn render_edit_form(
    state: &AppState,
    session: &Session,
    admin: &CurrentAdmin,
    id: &ProductId,
    form: ProductEditForm,
    errors: FieldErrors,
) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        ProductEditTemplate {
            layout: Layout::new(state, session, admin, "/products").await,
            product_id: id.to_string(),
            product_name: form.name.clone(),
            form,
            errors,
            categories: &PRODUCT_CATEGORIES,
        },
    )
        .into_response()
}

/// Product list page handler.
///
/// GET /products
#[instrument(skip_all)]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<ListQuery>,
) -> Response {
    let result = state.stores().products.all(&admin.token).await;
    let products = match load_or_toast(
        &state,
        &session,
        &admin,
        result,
        "Failed to fetch products",
        Default::default,
    )
    .await
    {
        Loaded::Ready(products) => products,
        Loaded::Expired(response) => return response,
    };

    let config = state.config();
    let mut matching = filter_products(&products, query.category_filter(), query.search_term());
    sort_products(&mut matching, query.sort_key(), query.direction());
    let page = paginate(matching, query.page(), config.pagination.products_per_page);

    let table = products_table_config();
    ProductsIndexTemplate {
        layout: Layout::new(&state, &session, &admin, "/products").await,
        headers: column_headers(&table, &query),
        rows: page
            .items
            .iter()
            .map(|p| ProductRow::new(p, config.currency, config.low_stock_threshold))
            .collect(),
        nav: PageNav::new("/products", &query, &page),
        search_value: query.search_term().unwrap_or_default().to_owned(),
        category_value: query.category_filter().unwrap_or_default().to_owned(),
        table,
    }
    .into_response()
}

/// Add-product form.
///
/// GET /products/new
pub async fn new_form(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
) -> Response {
    ProductNewTemplate {
        layout: Layout::new(&state, &session, &admin, "/products").await,
        form: ProductForm::default(),
        errors: FieldErrors::new(),
        categories: &PRODUCT_CATEGORIES,
        max_images: Product::MAX_IMAGES,
    }
    .into_response()
}

/// Create a product from the multipart form.
///
/// POST /products
#[instrument(skip_all)]
pub async fn create(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    multipart: Multipart,
) -> Response {
    let parts = match read_multipart(multipart).await {
        Ok(parts) => parts,
        Err(e) => {
            tracing::warn!(error = %e, "Unreadable product upload");
            flash::push(&session, Toast::error("Failed to create product")).await;
            return Redirect::to("/products/new").into_response();
        }
    };
    let form = parts.product_form();

    let product = match form.validate(parts.uploads.len()) {
        Ok(product) => product,
        Err(errors) => return render_new_form(&state, &session, &admin, form, errors).await,
    };

    match state
        .stores()
        .products
        .create(&admin.token, &product, parts.uploads)
        .await
    {
        Ok(()) => {
            flash::push(&session, Toast::success("Product created successfully")).await;
            Redirect::to("/products").into_response()
        }
        Err(e) if e.is_unauthorized() => super::expire_session(&state, &session, &admin).await,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to create product");
            flash::push(&session, Toast::error(e.user_message("Failed to create product"))).await;
            render_new_form(&state, &session, &admin, form, FieldErrors::new()).await
        }
    }
}

/// Force a re-fetch of the product list.
///
/// POST /products/refresh
#[instrument(skip_all)]
pub async fn refresh(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
) -> Response {
    match state.stores().products.refresh(&admin.token).await {
        Ok(products) => {
            tracing::info!(count = products.len(), "Product list refreshed");
            flash::push(&session, Toast::info("Product list refreshed")).await;
            Redirect::to("/products").into_response()
        }
        Err(e) => {
            mutation_failed(&state, &session, &admin, &e, "Failed to fetch products", "/products")
                .await
        }
    }
}

/// Product detail page.
///
/// GET /products/{id}
#[instrument(skip_all, fields(product_id = %id))]
pub async fn show(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<ProductId>,
) -> Response {
    let product = match find_or_respond(&state, &session, &admin, &id).await {
        Ok(product) => product,
        Err(response) => return response,
    };
    let config = state.config();
    ProductShowTemplate {
        layout: Layout::new(&state, &session, &admin, "/products").await,
        row: ProductRow::new(&product, config.currency, config.low_stock_threshold),
        product,
    }
    .into_response()
}

/// Edit-product form.
///
/// GET /products/{id}/edit
#[instrument(skip_all, fields(product_id = %id))]
pub async fn edit_form(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<ProductId>,
) -> Response {
    let product = match find_or_respond(&state, &session, &admin, &id).await {
        Ok(product) => product,
        Err(response) => return response,
    };
    ProductEditTemplate {
        layout: Layout::new(&state, &session, &admin, "/products").await,
        product_id: product.id.to_string(),
        product_name: product.name.clone(),
        form: ProductEditForm::from_product(&product),
        errors: FieldErrors::new(),
        categories: &PRODUCT_CATEGORIES,
    }
    .into_response()
}

/// Update a product's fields.
///
/// POST /products/{id}
#[instrument(skip_all, fields(product_id = %id))]
pub async fn update(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<ProductId>,
    Form(form): Form<ProductEditForm>,
) -> Response {
    let update = match form.validate() {
        Ok(update) => update,
        Err(errors) => return render_edit_form(&state, &session, &admin, &id, form, errors).await,
    };

    match state
        .stores()
        .products
        .update(&admin.token, &id, &update)
        .await
    {
        Ok((_, message)) => {
            let message = message.unwrap_or_else(|| "Product updated successfully".to_string());
            flash::push(&session, Toast::success(message)).await;
            Redirect::to("/products").into_response()
        }
        Err(e) if e.is_unauthorized() => super::expire_session(&state, &session, &admin).await,
        Err(StoreError::NotFound(_)) => {
            flash::push(&session, Toast::error("Product not found")).await;
            Redirect::to("/products").into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to update product");
            flash::push(&session, Toast::error(e.user_message("Failed to update product"))).await;
            render_edit_form(&state, &session, &admin, &id, form, FieldErrors::new()).await
        }
    }
}

/// Image manager.
///
/// GET /products/{id}/images
#[instrument(skip_all, fields(product_id = %id))]
pub async fn images_form(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<ProductId>,
) -> Response {
    let product = match find_or_respond(&state, &session, &admin, &id).await {
        Ok(product) => product,
        Err(response) => return response,
    };
    ProductImagesTemplate {
        layout: Layout::new(&state, &session, &admin, "/products").await,
        product,
        max_images: Product::MAX_IMAGES,
    }
    .into_response()
}

/// Replace a product's image set with the kept images plus new uploads.
///
/// POST /products/{id}/images
#[instrument(skip_all, fields(product_id = %id))]
pub async fn update_images(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<ProductId>,
    multipart: Multipart,
) -> Response {
    let back = format!("/products/{id}/images");
    let parts = match read_multipart(multipart).await {
        Ok(parts) => parts,
        Err(e) => {
            tracing::warn!(error = %e, "Unreadable image upload");
            flash::push(&session, Toast::error("Failed to update images")).await;
            return Redirect::to(&back).into_response();
        }
    };
    let existing: Vec<String> = parts.values("existing_images").map(str::to_owned).collect();

    match state
        .stores()
        .products
        .update_images(&admin.token, &id, &existing, parts.uploads)
        .await
    {
        Ok((product, message)) => {
            let message = message.unwrap_or_else(|| "Images updated successfully".to_string());
            flash::push(&session, Toast::success(message)).await;
            Redirect::to(&format!("/products/{}", product.id)).into_response()
        }
        Err(e) => mutation_failed(&state, &session, &admin, &e, "Failed to update images", &back).await,
    }
}

/// Delete confirmation.
///
/// GET /products/{id}/delete
#[instrument(skip_all, fields(product_id = %id))]
pub async fn delete_confirm(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<ProductId>,
) -> Response {
    let product = match find_or_respond(&state, &session, &admin, &id).await {
        Ok(product) => product,
        Err(response) => return response,
    };
    ProductDeleteTemplate {
        layout: Layout::new(&state, &session, &admin, "/products").await,
        product,
    }
    .into_response()
}

/// Delete a product.
///
/// POST /products/{id}/delete
#[instrument(skip_all, fields(product_id = %id))]
pub async fn delete(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<ProductId>,
) -> Response {
    match state.stores().products.delete(&admin.token, &id).await {
        Ok(()) => {
            flash::push(&session, Toast::success("Product deleted successfully")).await;
            Redirect::to("/products").into_response()
        }
        Err(e) => {
            mutation_failed(&state, &session, &admin, &e, "Failed to delete product", "/products")
                .await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_form_joins_repeated_categories() {
        let parts = MultipartFields {
            fields: vec![
                ("name".into(), "Shea Butter".into()),
                ("category".into(), "Face".into()),
                ("category".into(), "Body and Bath".into()),
                ("price".into(), "4500".into()),
                ("is_featured".into(), "on".into()),
            ],
            uploads: vec![],
        };
        let form = parts.product_form();
        assert_eq!(form.name, "Shea Butter");
        assert_eq!(form.category, "Face, Body and Bath");
        assert_eq!(form.is_featured.as_deref(), Some("on"));
        assert!(form.bestseller.is_none());
    }

    #[test]
    fn test_category_selected() {
        assert!(category_selected("Face, Body and Bath", "body and bath"));
        assert!(!category_selected("Face", "Haircare"));
        assert!(!category_selected("", "Face"));
    }

    #[test]
    fn test_column_headers_toggle_active_sort() {
        let table = products_table_config();
        let query = ListQuery {
            sort: Some("price".into()),
            dir: Some("asc".into()),
            page: Some(3),
            ..ListQuery::default()
        };
        let headers = column_headers(&table, &query);
        let price = headers.iter().find(|h| h.label == "Price").expect("price column");
        assert_eq!(price.direction, Some("asc"));
        assert_eq!(price.href.as_deref(), Some("/products?sort=price&dir=desc"));

        let image = headers.iter().find(|h| h.label == "Image").expect("image column");
        assert!(image.href.is_none());
    }
}
