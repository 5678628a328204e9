pub mod admin;
pub mod buyers;
pub mod events;
pub mod sellers;

#[cfg(test)]
mod tests {
    #[test]
    fn buyer_and_seller_order_views_keep_distinct_schema_names() {
        let routes = super::buyers::orders::routes_with_openapi()
            .merge(super::sellers::orders::routes_with_openapi());
        let openapi = routes.get_openapi();
        let schemas = &openapi
            .components
            .as_ref()
            .expect("merged document has components")
            .schemas;
        assert!(schemas.contains_key("OrderWithItems"));
        assert!(schemas.contains_key("SellerOrderWithItems"));
    }
}
