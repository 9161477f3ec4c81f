// storefront/src/models/mod.rs

//! Data structures representing database entities and the validated inputs
//! used to create or change them.

pub mod cart_line;
pub mod category;
pub mod checkout_draft;
pub mod order;
pub mod product;

pub use cart_line::{AddToCartForm, CartLine, CartLineView, CartTotals};
pub use category::{Category, CategoryInput};
pub use checkout_draft::{CheckoutDraft, ShippingAddress};
pub use order::{Order, OrderDetail, OrderDetailView, OrderWithDetails};
pub use product::{Product, ProductInput, ProductListing};
