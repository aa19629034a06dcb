use chrono::{DateTime, Utc};
use listpull_engine::{
    db_types::{
        AuditActor,
        AuditEntry,
        EmailJob,
        EmailStatus,
        NewEmailJob,
        NewOrder,
        Order,
        OrderItem,
        OrderNumber,
        OrderStatusType,
        StaffRole,
        StaffUser,
    },
    traits::{
        EmailQueueError,
        EmailQueueManagement,
        OrderManagement,
        OrderStoreError,
        StaffManagement,
        StaffStoreError,
        StatusCounts,
    },
};
use mockall::mock;

mock! {
    pub Backend {}
    impl OrderManagement for Backend {
        async fn insert_order(&self, order_number: &OrderNumber, order: &NewOrder, now: DateTime<Utc>) -> Result<Order, OrderStoreError>;
        async fn fetch_order_by_id(&self, id: i64) -> Result<Option<Order>, OrderStoreError>;
        async fn fetch_order_by_number(&self, order_number: &OrderNumber) -> Result<Option<Order>, OrderStoreError>;
        async fn fetch_order_items(&self, order_id: i64) -> Result<Vec<OrderItem>, OrderStoreError>;
        async fn update_order_status(&self, order_id: i64, old_status: OrderStatusType, new_status: OrderStatusType, actor: &AuditActor, now: DateTime<Utc>) -> Result<Order, OrderStoreError>;
        async fn fetch_audit_log(&self, order_id: i64) -> Result<Vec<AuditEntry>, OrderStoreError>;
        async fn count_orders_by_status(&self) -> Result<StatusCounts, OrderStoreError>;
        async fn fetch_stale_submitted(&self, cutoff: DateTime<Utc>, unalerted_only: bool) -> Result<Vec<Order>, OrderStoreError>;
        async fn fetch_stale_ready(&self, cutoff: DateTime<Utc>, unalerted_only: bool) -> Result<Vec<Order>, OrderStoreError>;
        async fn mark_stale_alert_sent(&self, order_id: i64) -> Result<(), OrderStoreError>;
        async fn mark_pickup_alert_sent(&self, order_id: i64) -> Result<(), OrderStoreError>;
    }
    impl EmailQueueManagement for Backend {
        async fn enqueue_email(&self, job: NewEmailJob) -> Result<EmailJob, EmailQueueError>;
        async fn fetch_email_job(&self, id: i64) -> Result<Option<EmailJob>, EmailQueueError>;
        async fn fetch_pending_emails(&self) -> Result<Vec<EmailJob>, EmailQueueError>;
        async fn fetch_emails(&self, status: Option<EmailStatus>) -> Result<Vec<EmailJob>, EmailQueueError>;
        async fn mark_email_sent(&self, id: i64, sent_at: DateTime<Utc>) -> Result<EmailJob, EmailQueueError>;
        async fn record_email_failure(&self, id: i64, error: &str, max_attempts: i64) -> Result<EmailJob, EmailQueueError>;
        async fn delete_finished_emails_before(&self, cutoff: DateTime<Utc>) -> Result<u64, EmailQueueError>;
    }
    impl StaffManagement for Backend {
        async fn fetch_staff_user(&self, id: i64) -> Result<Option<StaffUser>, StaffStoreError>;
        async fn create_staff_user(&self, email: &str, password_hash: &str, role: StaffRole, now: DateTime<Utc>) -> Result<StaffUser, StaffStoreError>;
    }
}
