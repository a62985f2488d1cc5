//! SeaORM entity models
//!
//! Database entities for CampusRate

mod building;
mod cafe;
mod course;
mod forum_post;
mod forum_thread;
mod professor;
mod profile;
mod review;
mod vote;

pub use professor::{
    Entity as ProfessorEntity,
    Model as Professor,
    ActiveModel as ProfessorActiveModel,
    Column as ProfessorColumn,
};

pub use course::{
    Entity as CourseEntity,
    Model as Course,
    ActiveModel as CourseActiveModel,
    Column as CourseColumn,
};

pub use building::{
    Entity as BuildingEntity,
    Model as Building,
    ActiveModel as BuildingActiveModel,
    Column as BuildingColumn,
};

pub use cafe::{
    Entity as CafeEntity,
    Model as Cafe,
    ActiveModel as CafeActiveModel,
    Column as CafeColumn,
};

pub use review::{
    Entity as ReviewEntity,
    Model as Review,
    ActiveModel as ReviewActiveModel,
    Column as ReviewColumn,
};

pub use vote::{
    Entity as VoteEntity,
    Model as Vote,
    ActiveModel as VoteActiveModel,
    Column as VoteColumn,
};

pub use profile::{
    Entity as ProfileEntity,
    Model as Profile,
    ActiveModel as ProfileActiveModel,
    Column as ProfileColumn,
};

pub use forum_thread::{
    Entity as ForumThreadEntity,
    Model as ForumThread,
    ActiveModel as ForumThreadActiveModel,
    Column as ForumThreadColumn,
};

pub use forum_post::{
    Entity as ForumPostEntity,
    Model as ForumPost,
    ActiveModel as ForumPostActiveModel,
    Column as ForumPostColumn,
};
