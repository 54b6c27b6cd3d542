use boards_core::{Board, BoardId, BoardType};
use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, OptionalExtension, params_from_iter};

use crate::error::StorageError;
use crate::query::{Insert, Select, text};
use crate::store::SqlStore;

impl SqlStore {
    pub fn insert_board(&self, conn: &Connection, board: &Board) -> Result<(), StorageError> {
        let (sql, params) = Insert::new(&self.boards_table())
            .value("id", text(&board.id))
            .value("team_id", text(&board.team_id))
            .value("type", text(board.board_type.as_str()))
            .value("title", text(&board.title))
            .value("is_template", SqlValue::Integer(board.is_template as i64))
            .value("created_by", text(&board.created_by))
            .value("create_at", SqlValue::Integer(board.create_at))
            .value("update_at", SqlValue::Integer(board.update_at))
            .value("delete_at", SqlValue::Integer(board.delete_at))
            .build(self.dialect());
        self.exec(conn, &sql, &params)?;
        Ok(())
    }

    pub fn get_board(
        &self,
        conn: &Connection,
        board_id: &BoardId,
    ) -> Result<Option<Board>, StorageError> {
        let columns = [
            "id",
            "team_id",
            "type",
            "title",
            "is_template",
            "created_by",
            "create_at",
            "update_at",
            "delete_at",
        ];
        let (sql, params) = Select::new(columns.iter().map(|c| c.to_string()).collect())
            .from(&self.boards_table())
            .where_eq("id", text(board_id))
            .build(self.dialect());
        let row = conn
            .query_row(&sql, params_from_iter(params.iter()), |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, bool>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, i64>(6)?,
                    row.get::<_, i64>(7)?,
                    row.get::<_, i64>(8)?,
                ))
            })
            .optional()
            .inspect_err(|e| log::error!("getBoard ERROR: {e}"))?;

        let Some((
            id,
            team_id,
            board_type,
            title,
            is_template,
            created_by,
            create_at,
            update_at,
            delete_at,
        )) = row
        else {
            return Ok(None);
        };
        Ok(Some(Board {
            id: id.into(),
            team_id: team_id.into(),
            board_type: BoardType::parse(&board_type)?,
            title,
            is_template,
            created_by: created_by.into(),
            create_at,
            update_at,
            delete_at,
        }))
    }
}
