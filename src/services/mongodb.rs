use mongodb::{Client, ClientSession, Collection};
use mongodb::bson::{self, doc, oid::ObjectId, Document};
use mongodb::options::{ClientOptions, FindOptions, IndexOptions, ReturnDocument, ServerApi, ServerApiVersion};
use mongodb::IndexModel;
use futures_util::TryStreamExt;
use chrono::Utc;

use crate::models::{
    ApiError, ApprovalStatus, MenuItem, Notification, Offer, Restaurant, RestaurantApproval,
    RestaurantStatus, Review, User,
};

#[derive(Clone)]
pub struct MongoDBService {
    client: Client,
    users: Collection<User>,
    restaurants: Collection<Restaurant>,
    approvals: Collection<RestaurantApproval>,
    notifications: Collection<Notification>,
    #[allow(dead_code)] // Passive schemas, read by the menu/offer/review routes of the wider app
    menu_items: Collection<MenuItem>,
    #[allow(dead_code)]
    offers: Collection<Offer>,
    #[allow(dead_code)]
    reviews: Collection<Review>,
}

impl MongoDBService {
    pub async fn init(uri: &str) -> Result<Self, mongodb::error::Error> {
        // Parse options and configure client
        let mut client_options = ClientOptions::parse(uri).await?;

        // Set the server API version to V1
        let server_api = ServerApi::builder()
            .version(ServerApiVersion::V1)
            .strict(true)
            .deprecation_errors(true)
            .build();
        client_options.server_api = Some(server_api);

        client_options.connect_timeout = Some(std::time::Duration::from_secs(10));
        client_options.server_selection_timeout = Some(std::time::Duration::from_secs(5));

        let client = Client::with_options(client_options)?;

        // Test connection
        client
            .database("admin")
            .run_command(doc! {"ping": 1}, None)
            .await?;

        log::info!("Successfully connected to MongoDB!");

        let db = client.database("yumrun");
        let users = db.collection("users");
        let restaurants = db.collection::<Restaurant>("restaurants");
        let approvals = db.collection::<RestaurantApproval>("restaurantapprovals");
        let notifications = db.collection::<Notification>("notifications");
        let menu_items = db.collection("menuitems");
        let offers = db.collection("offers");
        let reviews = db.collection("reviews");

        // Unique index on email
        let email_options = IndexOptions::builder().unique(true).build();
        let email_model = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(email_options)
            .build();
        users.create_index(email_model, None).await?;

        // Exactly one restaurant per owner
        let owner_options = IndexOptions::builder().unique(true).build();
        let owner_model = IndexModel::builder()
            .keys(doc! { "ownerId": 1 })
            .options(owner_options)
            .build();
        restaurants.create_index(owner_model, None).await?;

        // At most one pending approval per restaurant, enforced by the
        // storage layer rather than a check-then-act in the handlers.
        let pending_options = IndexOptions::builder()
            .unique(true)
            .partial_filter_expression(doc! { "status": "pending" })
            .build();
        let pending_model = IndexModel::builder()
            .keys(doc! { "restaurantId": 1 })
            .options(pending_options)
            .build();
        approvals.create_index(pending_model, None).await?;

        // Inbox queries: per-user unread and admin-broadcast unread
        let user_inbox_model = IndexModel::builder()
            .keys(doc! { "userId": 1, "isRead": 1 })
            .build();
        notifications.create_index(user_inbox_model, None).await?;

        let admin_inbox_model = IndexModel::builder()
            .keys(doc! { "isAdminNotification": 1, "isRead": 1 })
            .build();
        notifications.create_index(admin_inbox_model, None).await?;

        // Menu lookups by restaurant reference
        let menu_model = IndexModel::builder()
            .keys(doc! { "restaurant": 1 })
            .build();
        menu_items.create_index(menu_model, None).await?;

        Ok(Self {
            client,
            users,
            restaurants,
            approvals,
            notifications,
            menu_items,
            offers,
            reviews,
        })
    }

    pub async fn start_session(&self) -> Result<ClientSession, ApiError> {
        self.client.start_session(None).await.map_err(ApiError::DatabaseError)
    }

    // User methods

    pub async fn get_user_by_id(&self, id: &ObjectId) -> Result<Option<User>, ApiError> {
        self.users
            .find_one(doc! { "_id": id }, None)
            .await
            .map_err(ApiError::DatabaseError)
    }

    // Restaurant methods

    pub async fn get_restaurant_by_owner(&self, owner_id: &ObjectId) -> Result<Option<Restaurant>, ApiError> {
        self.restaurants
            .find_one(doc! { "ownerId": owner_id }, None)
            .await
            .map_err(ApiError::DatabaseError)
    }

    pub async fn get_restaurant_by_id(&self, id: &ObjectId) -> Result<Option<Restaurant>, ApiError> {
        self.restaurants
            .find_one(doc! { "_id": id }, None)
            .await
            .map_err(ApiError::DatabaseError)
    }

    pub async fn update_restaurant_with_session(
        &self,
        id: &ObjectId,
        mut set: Document,
        session: &mut ClientSession,
    ) -> Result<(), ApiError> {
        set.insert("updatedAt", bson::DateTime::from_chrono(Utc::now()));
        self.restaurants
            .update_one_with_session(doc! { "_id": id }, doc! { "$set": set }, None, session)
            .await
            .map_err(ApiError::DatabaseError)?;
        Ok(())
    }

    pub async fn set_restaurant_status_with_session(
        &self,
        id: &ObjectId,
        status: RestaurantStatus,
        session: &mut ClientSession,
    ) -> Result<(), ApiError> {
        self.update_restaurant_with_session(id, doc! { "status": status.to_string() }, session)
            .await
    }

    // Approval methods

    pub async fn find_pending_approval(&self, restaurant_id: &ObjectId) -> Result<Option<RestaurantApproval>, ApiError> {
        self.approvals
            .find_one(doc! { "restaurantId": restaurant_id, "status": "pending" }, None)
            .await
            .map_err(ApiError::DatabaseError)
    }

    pub async fn get_approval_by_id(&self, id: &ObjectId) -> Result<Option<RestaurantApproval>, ApiError> {
        self.approvals
            .find_one(doc! { "_id": id }, None)
            .await
            .map_err(ApiError::DatabaseError)
    }

    pub async fn list_pending_approvals(&self) -> Result<Vec<RestaurantApproval>, ApiError> {
        let options = FindOptions::builder().sort(doc! { "createdAt": 1 }).build();
        self.approvals
            .find(doc! { "status": "pending" }, options)
            .await
            .map_err(ApiError::DatabaseError)?
            .try_collect()
            .await
            .map_err(ApiError::DatabaseError)
    }

    pub async fn insert_approval_with_session(
        &self,
        approval: &RestaurantApproval,
        session: &mut ClientSession,
    ) -> Result<ObjectId, ApiError> {
        let result = self
            .approvals
            .insert_one_with_session(approval, None, session)
            .await
            .map_err(|e| {
                // The partial unique index backstops the duplicate-pending check
                if e.to_string().contains("E11000 duplicate key error") {
                    ApiError::Conflict("This restaurant already has pending changes".to_string())
                } else {
                    ApiError::DatabaseError(e)
                }
            })?;
        result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| ApiError::InternalError("Inserted approval id was not an ObjectId".to_string()))
    }

    /// Compare-and-swap the approval out of `pending`. Returns the updated
    /// document, or None when the approval was already terminal.
    pub async fn resolve_approval_with_session(
        &self,
        id: &ObjectId,
        status: ApprovalStatus,
        processed_by: &ObjectId,
        rejection_reason: Option<&str>,
        session: &mut ClientSession,
    ) -> Result<Option<RestaurantApproval>, ApiError> {
        let now = bson::DateTime::from_chrono(Utc::now());
        let mut set = doc! {
            "status": status.to_string(),
            "processedBy": processed_by,
            "processedAt": now,
            "updatedAt": now,
        };
        if let Some(reason) = rejection_reason {
            set.insert("rejectionReason", reason);
        }

        let options = mongodb::options::FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        self.approvals
            .find_one_and_update_with_session(
                doc! { "_id": id, "status": "pending" },
                doc! { "$set": set },
                options,
                session,
            )
            .await
            .map_err(ApiError::DatabaseError)
    }

    // Notification methods

    pub async fn insert_notification(&self, notification: &Notification) -> Result<ObjectId, ApiError> {
        let result = self
            .notifications
            .insert_one(notification, None)
            .await
            .map_err(ApiError::DatabaseError)?;
        result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| ApiError::InternalError("Inserted notification id was not an ObjectId".to_string()))
    }

    pub async fn insert_notification_with_session(
        &self,
        notification: &Notification,
        session: &mut ClientSession,
    ) -> Result<(), ApiError> {
        self.notifications
            .insert_one_with_session(notification, None, session)
            .await
            .map_err(ApiError::DatabaseError)?;
        Ok(())
    }

    pub async fn list_notifications(&self, selector: Document) -> Result<Vec<Notification>, ApiError> {
        let options = FindOptions::builder()
            .sort(doc! { "createdAt": -1 })
            .limit(100)
            .build();
        self.notifications
            .find(selector, options)
            .await
            .map_err(ApiError::DatabaseError)?
            .try_collect()
            .await
            .map_err(ApiError::DatabaseError)
    }

    pub async fn count_unread_notifications(&self, mut selector: Document) -> Result<u64, ApiError> {
        selector.insert("isRead", false);
        self.notifications
            .count_documents(selector, None)
            .await
            .map_err(ApiError::DatabaseError)
    }

    /// Flip isRead on one notification, scoped to the requester's selector
    /// so nobody can mark someone else's inbox.
    pub async fn mark_notification_read(&self, id: &ObjectId, mut selector: Document) -> Result<bool, ApiError> {
        selector.insert("_id", *id);
        let result = self
            .notifications
            .update_one(selector, doc! { "$set": { "isRead": true } }, None)
            .await
            .map_err(ApiError::DatabaseError)?;
        Ok(result.matched_count > 0)
    }

    pub async fn mark_all_notifications_read(&self, selector: Document) -> Result<u64, ApiError> {
        let result = self
            .notifications
            .update_many(selector, doc! { "$set": { "isRead": true } }, None)
            .await
            .map_err(ApiError::DatabaseError)?;
        Ok(result.modified_count)
    }

    pub async fn delete_notification(&self, id: &ObjectId, mut selector: Document) -> Result<bool, ApiError> {
        selector.insert("_id", *id);
        let result = self
            .notifications
            .delete_one(selector, None)
            .await
            .map_err(ApiError::DatabaseError)?;
        Ok(result.deleted_count > 0)
    }
}
