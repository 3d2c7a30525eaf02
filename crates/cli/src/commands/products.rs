//! Catalog listings.

use std::io::Write;

use storedesk_core::listing::filter_products;
use storedesk_core::metrics::low_stock as low_stock_products;
use storedesk_core::{CurrencyCode, Product};

use super::{CliError, Context, Output};

/// `id  name  brand  price  stock` for one product.
fn product_line(product: &Product, currency: CurrencyCode) -> String {
    let price = currency.format(product.effective_price());
    format!(
        "{}\t{}\t{}\t{}\t{} in stock",
        product.id, product.name, product.brand, price, product.count_in_stock
    )
}

pub async fn list<W: Write>(
    ctx: &Context,
    out: &mut Output<W>,
    search: Option<&str>,
    category: Option<&str>,
    json: bool,
) -> Result<(), CliError> {
    let products = ctx.api.list_products(ctx.token()).await?;
    let search = search.map(str::trim).filter(|s| !s.is_empty());
    let matching = filter_products(&products, category, search);

    if json {
        return out.json(&matching);
    }
    for product in &matching {
        out.line(product_line(product, ctx.currency))?;
    }
    tracing::info!(shown = matching.len(), total = products.len(), "Listed products");
    Ok(())
}

pub async fn low_stock<W: Write>(
    ctx: &Context,
    out: &mut Output<W>,
    threshold: i64,
) -> Result<(), CliError> {
    let products = ctx.api.list_products(ctx.token()).await?;
    let low = low_stock_products(&products, threshold);
    if low.is_empty() {
        tracing::info!(threshold, "No products at or below the threshold");
    }
    for product in low {
        out.line(product_line(product, ctx.currency))?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_product_line_uses_sale_price() {
        let product: Product = serde_json::from_value(json!({
            "_id": "p1",
            "name": "Glow Serum",
            "brand": "Lumi",
            "price": 12000,
            "discountedPrice": 9500,
            "countInStock": 3
        }))
        .unwrap();

        assert_eq!(
            product_line(&product, CurrencyCode::NGN),
            "p1\tGlow Serum\tLumi\t₦9,500.00\t3 in stock"
        );
    }
}
