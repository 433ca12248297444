use sqlx::PgPool;

use crate::db::models::Enrollment;

const COLUMNS: &str = "id, class_id, academic_year_id, student_id, created_at";

/// A student on a class roster.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct RosterStudent {
    pub(crate) id: String,
    pub(crate) full_name: String,
    pub(crate) student_number: Option<String>,
    pub(crate) national_student_number: Option<String>,
}

/// Inserts one row per student; students already on the roster are skipped.
pub(crate) async fn insert_many(
    executor: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    class_id: &str,
    academic_year_id: &str,
    student_ids: &[String],
    now: time::PrimitiveDateTime,
) -> Result<Vec<Enrollment>, sqlx::Error> {
    let mut created = Vec::with_capacity(student_ids.len());
    for student_id in student_ids {
        let row = sqlx::query_as::<_, Enrollment>(&format!(
            "INSERT INTO class_students (id, class_id, academic_year_id, student_id, created_at)
             VALUES ($1,$2,$3,$4,$5)
             ON CONFLICT (class_id, academic_year_id, student_id) WHERE deleted_at IS NULL
             DO NOTHING
             RETURNING {COLUMNS}"
        ))
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(class_id)
        .bind(academic_year_id)
        .bind(student_id)
        .bind(now)
        .fetch_optional(&mut **executor)
        .await?;

        if let Some(row) = row {
            created.push(row);
        }
    }

    Ok(created)
}

pub(crate) async fn soft_delete(
    pool: &PgPool,
    id: &str,
    now: time::PrimitiveDateTime,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE class_students SET deleted_at = $1 WHERE id = $2 AND deleted_at IS NULL",
    )
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Unique students enrolled in the class for the academic year, ordered by name.
pub(crate) async fn list_students(
    pool: &PgPool,
    class_id: &str,
    academic_year_id: &str,
) -> Result<Vec<RosterStudent>, sqlx::Error> {
    sqlx::query_as::<_, RosterStudent>(
        "SELECT DISTINCT u.id, u.full_name, u.student_number, u.national_student_number
         FROM class_students cs
         JOIN users u ON u.id = cs.student_id AND u.deleted_at IS NULL
         WHERE cs.class_id = $1
           AND cs.academic_year_id = $2
           AND cs.deleted_at IS NULL
         ORDER BY u.full_name ASC, u.id ASC",
    )
    .bind(class_id)
    .bind(academic_year_id)
    .fetch_all(pool)
    .await
}
