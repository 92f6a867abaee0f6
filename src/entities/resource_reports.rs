use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "resource_reports")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Unique: at most one current snapshot per facility, which also makes
    /// the submit path an atomic insert-or-update.
    #[sea_orm(unique)]
    pub facility_id: i32,

    pub icu_beds_available: i32,

    pub ventilators_available: i32,

    pub staff_on_duty: i32,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::facilities::Entity",
        from = "Column::FacilityId",
        to = "super::facilities::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Facilities,
}

impl Related<super::facilities::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Facilities.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
