use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "films")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub release_date: String,
    pub duration: i32,
    pub mpa_id: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::mpa::Entity",
        from = "Column::MpaId",
        to = "super::mpa::Column::Id"
    )]
    Mpa,
    #[sea_orm(has_many = "super::film_like::Entity")]
    FilmLike,
}

impl Related<super::mpa::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Mpa.def()
    }
}

impl Related<super::film_like::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FilmLike.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
