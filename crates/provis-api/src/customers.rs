// Customer endpoints

use tracing::debug;

use crate::client::ApiClient;
use crate::error::Error;
use crate::models::{Customer, CustomerInput};

impl ApiClient {
    /// `GET /customers`
    pub async fn list_customers(&self) -> Result<Vec<Customer>, Error> {
        self.get("customers").await
    }

    /// `POST /customers`
    pub async fn create_customer(&self, input: &CustomerInput) -> Result<Customer, Error> {
        debug!(name = ?input.name, "creating customer");
        self.post("customers", input).await
    }

    /// `PATCH /customers/:id`
    pub async fn update_customer(&self, id: &str, input: &CustomerInput) -> Result<Customer, Error> {
        debug!(id, "updating customer");
        self.patch(&format!("customers/{id}"), input).await
    }

    /// `DELETE /customers/:id`
    pub async fn delete_customer(&self, id: &str) -> Result<(), Error> {
        debug!(id, "deleting customer");
        self.delete(&format!("customers/{id}")).await
    }
}
