use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
    sea_query::{OnConflict, Query, SelectStatement},
};

use crate::{
    entities::{film_like, friendship, user},
    error::AppResult,
    models::User,
};

#[derive(Clone)]
pub struct UserStorage {
    db: DatabaseConnection,
}

impl UserStorage {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn all(&self) -> AppResult<Vec<User>> {
        let rows = user::Entity::find().order_by_asc(user::Column::Id).all(&self.db).await?;
        rows.into_iter().map(User::try_from).collect()
    }

    pub async fn get(&self, id: i32) -> AppResult<Option<User>> {
        let row = user::Entity::find_by_id(id).one(&self.db).await?;
        row.map(User::try_from).transpose()
    }

    pub async fn exists(&self, id: i32) -> AppResult<bool> {
        Ok(user::Entity::find_by_id(id).one(&self.db).await?.is_some())
    }

    pub async fn insert(&self, user: &User) -> AppResult<User> {
        let model = user::ActiveModel {
            id: Default::default(),
            email: Set(user.email.clone()),
            login: Set(user.login.clone()),
            name: Set(user.name.clone()),
            birthday: Set(user.birthday.map(|b| b.to_string())),
        };
        let id = user::Entity::insert(model).exec(&self.db).await?.last_insert_id;
        Ok(User { id, ..user.clone() })
    }

    /// Returns `false` when no user had this id.
    pub async fn update(&self, user: &User) -> AppResult<bool> {
        let model = user::ActiveModel {
            id: Set(user.id),
            email: Set(user.email.clone()),
            login: Set(user.login.clone()),
            name: Set(user.name.clone()),
            birthday: Set(user.birthday.map(|b| b.to_string())),
        };
        match user::Entity::update(model).exec(&self.db).await {
            Ok(_) => Ok(true),
            Err(DbErr::RecordNotUpdated) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    /// Also drops the user's likes and every friendship on either side.
    pub async fn delete(&self, id: i32) -> AppResult<bool> {
        let txn = self.db.begin().await?;

        friendship::Entity::delete_many()
            .filter(
                Condition::any()
                    .add(friendship::Column::UserId.eq(id))
                    .add(friendship::Column::FriendId.eq(id)),
            )
            .exec(&txn)
            .await?;
        film_like::Entity::delete_many()
            .filter(film_like::Column::UserId.eq(id))
            .exec(&txn)
            .await?;
        let deleted = user::Entity::delete_by_id(id).exec(&txn).await?.rows_affected;

        txn.commit().await?;
        Ok(deleted > 0)
    }

    pub async fn add_friend(&self, user_id: i32, friend_id: i32) -> AppResult<()> {
        let model = friendship::ActiveModel { user_id: Set(user_id), friend_id: Set(friend_id) };
        friendship::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([friendship::Column::UserId, friendship::Column::FriendId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;
        Ok(())
    }

    pub async fn remove_friend(&self, user_id: i32, friend_id: i32) -> AppResult<bool> {
        let res = friendship::Entity::delete_many()
            .filter(friendship::Column::UserId.eq(user_id))
            .filter(friendship::Column::FriendId.eq(friend_id))
            .exec(&self.db)
            .await?;
        Ok(res.rows_affected > 0)
    }

    pub async fn friends(&self, user_id: i32) -> AppResult<Vec<User>> {
        let rows = user::Entity::find()
            .filter(user::Column::Id.in_subquery(friend_ids(user_id)))
            .order_by_asc(user::Column::Id)
            .all(&self.db)
            .await?;
        rows.into_iter().map(User::try_from).collect()
    }

    /// Users both `user_id` and `other_id` list as friends.
    pub async fn common_friends(&self, user_id: i32, other_id: i32) -> AppResult<Vec<User>> {
        let rows = user::Entity::find()
            .filter(user::Column::Id.in_subquery(friend_ids(user_id)))
            .filter(user::Column::Id.in_subquery(friend_ids(other_id)))
            .order_by_asc(user::Column::Id)
            .all(&self.db)
            .await?;
        rows.into_iter().map(User::try_from).collect()
    }
}

fn friend_ids(user_id: i32) -> SelectStatement {
    Query::select()
        .column(friendship::Column::FriendId)
        .from(friendship::Entity)
        .and_where(friendship::Column::UserId.eq(user_id))
        .to_owned()
}
