//! REST client glue for the backend microservices.
//!
//! [`ApiClient`] does transport, auth and error normalization. Each service
//! module adds typed models and the paths for one backend:
//!
//! | module          | backend       | paths                         |
//! |-----------------|---------------|-------------------------------|
//! | `catalog`       | catalog       | `/products`, `/skus/{id}/precio` |
//! | `orders`        | orders        | `/orders`                     |
//! | `users`         | users         | `/auth/login`, `/users/me`    |
//! | `zones`         | zones         | `/zones`                      |
//! | `routes`        | routes        | `/routes`                     |
//! | `notifications` | notifications | `/notifications`              |
//! | `cart`          | cart          | `/cart`, `/cart/items/{id}`   |

pub mod cart;
pub mod catalog;
pub mod client;
pub mod notifications;
pub mod orders;
pub mod routes;
pub mod users;
pub mod zones;

pub use cart::CartService;
pub use catalog::CatalogService;
pub use client::{ApiClient, RequestOptions, Service, Session, SessionListener};
pub use notifications::NotificationService;
pub use orders::OrderService;
pub use routes::RouteService;
pub use users::UserService;
pub use zones::ZoneService;

impl ApiClient {
    pub fn catalog(&self) -> CatalogService {
        CatalogService::new(self.clone())
    }

    pub fn orders(&self) -> OrderService {
        OrderService::new(self.clone())
    }

    pub fn users(&self) -> UserService {
        UserService::new(self.clone())
    }

    pub fn zones(&self) -> ZoneService {
        ZoneService::new(self.clone())
    }

    pub fn routes(&self) -> RouteService {
        RouteService::new(self.clone())
    }

    pub fn notifications(&self) -> NotificationService {
        NotificationService::new(self.clone())
    }

    pub fn cart(&self) -> CartService {
        CartService::new(self.clone())
    }
}

/// Percent-encode a path segment (ids may come from user input).
pub(crate) fn segment(id: &str) -> String {
    let mut out = String::with_capacity(id.len());
    for b in id.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => out.push(b as char),
            _ => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::segment;

    #[test]
    fn segments_are_escaped() {
        assert_eq!(segment("SKU-001"), "SKU-001");
        assert_eq!(segment("a/b c"), "a%2Fb%20c");
        assert_eq!(segment("ñ"), "%C3%B1");
    }
}
