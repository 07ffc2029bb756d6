//! Order aggregate, its requests and handlers.

mod aggregate;
mod commands;
mod handlers;
mod history;
mod line;
mod note;
mod queries;
mod status;
mod value_objects;

pub use aggregate::{ORDER_TOTAL_OUT_OF_RANGE, Order};
pub use commands::{
    AddOrderLine, AddOrderNote, AddressInput, CancelOrder, ClearOrder, CreateOrder,
    CustomerInput, MarkOrderPaid, PrepareOrder, ShipOrder,
};
pub use handlers::{ORDER_ALREADY_EXISTS, ORDER_NOT_FOUND, OrderHandlers};
pub use history::OrderHistory;
pub use line::{LINE_TOTAL_OUT_OF_RANGE, OrderLine};
pub use note::{MAX_NOTE_LENGTH, OrderNote};
pub use queries::{GetOrder, ListOrders, OrderSummary};
pub use status::OrderStatus;
pub use value_objects::{Address, Customer, SaleMethod, SaleNature};
