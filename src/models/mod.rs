pub mod address;
pub mod catalog;
pub mod consultation;
pub mod inquiry;
pub mod measurement;
pub mod order;
pub mod service;
pub mod user;

pub use address::Address;
pub use catalog::{Collection, Fabric, Product, ProductDisplay, Review};
pub use consultation::{Consultation, ConsultationStatus, ConsultationType, NewConsultation};
pub use inquiry::{ContactMessage, NewsletterSubscriber};
pub use measurement::{Measurement, MeasurementValues};
pub use order::{
    NewOrder, NewOrderItem, Order, OrderDetail, OrderItem, OrderStatus, OrderStatusHistory,
    OrderSummary, OrderTransition,
};
pub use service::ServiceType;
pub use user::{CreateUser, User, UserResponse, UserRole};
