//! TaskClient - ストアの一覧をメモリ上に映す（mirror）クライアント
//!
//! # フロー
//! 1. `load()` で一覧を一度だけ取得し、mirror を置き換える
//! 2. 各操作はストアに要求を送り、成功したら同じ変更を mirror に適用する
//! 3. 失敗時はログに残してエラーを返し、mirror は変更しない
//!
//! # キーの解決
//! 呼び出し側が渡すキー（インデックスでも ID でも）は、ストアに送る前に
//! mirror 上で安定 ID に解決します。フィルタ・ソート済みのビューから
//! 取ったインデックスが別のタスクを指すことはありません。

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use thiserror::Error;

use crate::domain::{NewTask, StoreError, Task, TaskId, TaskKey, TaskReplacement, TaskStatus};
use crate::ports::{Clock, SystemClock, TaskStore};

/// ClientError はクライアント操作のエラー
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("task text must not be empty")]
    EmptyText,

    #[error("no task {0} in the current list")]
    UnknownTask(TaskKey),

    #[error("task {0} is already done")]
    AlreadyDone(TaskId),

    #[error("{0} does not exist in the local time zone")]
    NonexistentLocalTime(NaiveDateTime),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// 変更後に mirror をどう更新するか
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncPolicy {
    /// ストアの応答を mirror に直接適用する
    #[default]
    Mirror,
    /// 変更が成功するたびに一覧を取り直す
    Refetch,
}

/// 編集で変更するフィールド。`None` は「変更しない」。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskEdit {
    pub text: Option<String>,
    pub date: Option<DateTime<Utc>>,
}

impl TaskEdit {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            date: None,
        }
    }

    pub fn date(date: DateTime<Utc>) -> Self {
        Self {
            text: None,
            date: Some(date),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.date.is_none()
    }
}

/// 日付と時刻を `tz` のローカル時刻として組み合わせ、UTC に直す。
///
/// その日のオフセットを使う（夏時間の切り替えをまたいでもずれない）。
/// 重複する時刻（夏時間の終わり）は早い方、存在しない時刻や
/// 表現できない日付はエラー。
pub fn compose_due<Tz: TimeZone>(
    day: NaiveDate,
    time: NaiveTime,
    tz: &Tz,
) -> Result<DateTime<Utc>, ClientError> {
    let local = day.and_time(time);
    tz.from_local_datetime(&local)
        .earliest()
        .map(|date| date.with_timezone(&Utc))
        .ok_or(ClientError::NonexistentLocalTime(local))
}

pub struct TaskClient<S, C = SystemClock, Tz = Utc> {
    store: S,
    clock: C,
    tz: Tz,
    policy: SyncPolicy,
    tasks: Vec<Task>,
}

impl<S: TaskStore> TaskClient<S> {
    pub fn new(store: S) -> Self {
        Self::with_clock(store, SystemClock)
    }
}

impl<S: TaskStore, C: Clock> TaskClient<S, C> {
    pub fn with_clock(store: S, clock: C) -> Self {
        Self {
            store,
            clock,
            tz: Utc,
            policy: SyncPolicy::default(),
            tasks: Vec::new(),
        }
    }
}

impl<S: TaskStore, C: Clock, Tz: TimeZone> TaskClient<S, C, Tz> {
    /// 日付・時刻入力を解釈するタイムゾーン。
    pub fn with_timezone<Z: TimeZone>(self, tz: Z) -> TaskClient<S, C, Z> {
        TaskClient {
            store: self.store,
            clock: self.clock,
            tz,
            policy: self.policy,
            tasks: self.tasks,
        }
    }

    pub fn with_policy(mut self, policy: SyncPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn timezone(&self) -> &Tz {
        &self.tz
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// 一覧を取得して mirror を置き換える。
    pub async fn load(&mut self) -> Result<&[Task], ClientError> {
        match self.store.list().await {
            Ok(tasks) => {
                tracing::debug!(count = tasks.len(), "loaded tasks");
                self.tasks = tasks;
                Ok(&self.tasks)
            }
            Err(e) => Err(self.failed("fetch tasks", e)),
        }
    }

    /// テキスト + 日付 + 時刻からタスクを追加する。
    pub async fn add(
        &mut self,
        text: &str,
        day: NaiveDate,
        time: NaiveTime,
    ) -> Result<&Task, ClientError> {
        let date = compose_due(day, time, &self.tz)?;
        self.add_at(text, date).await
    }

    /// 期日を指定してタスクを追加する。
    ///
    /// mirror には、ローカルで組み立てたものではなくストアの応答を入れる。
    pub async fn add_at(&mut self, text: &str, date: DateTime<Utc>) -> Result<&Task, ClientError> {
        if text.trim().is_empty() {
            return Err(ClientError::EmptyText);
        }
        let status = TaskStatus::classify(date, self.clock.now());
        let new_task = NewTask::new(text, date).with_status(status);

        let stored = match self.store.append(new_task).await {
            Ok(task) => task,
            Err(e) => return Err(self.failed("add task", e)),
        };
        let id = stored.id;
        self.sync(|tasks| tasks.push(stored)).await;
        self.find(id)
    }

    /// 指定したフィールドをマージして置き換える。
    ///
    /// Done でなければ、新しい期日からステータスを判定し直す。
    pub async fn edit(&mut self, key: TaskKey, edit: TaskEdit) -> Result<&Task, ClientError> {
        if edit.text.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(ClientError::EmptyText);
        }
        let current = self.resolve(key)?.clone();

        let mut replacement = current.to_replacement();
        if let Some(text) = edit.text {
            replacement.text = text;
        }
        if let Some(date) = edit.date {
            replacement.date = date;
        }
        if !current.status.is_done() {
            replacement.status = TaskStatus::classify(replacement.date, self.clock.now());
        }

        self.replace(current.id, replacement, "edit task").await
    }

    /// Done にする。既に Done ならストアには送らない。
    pub async fn mark_done(&mut self, key: TaskKey) -> Result<&Task, ClientError> {
        let current = self.resolve(key)?;
        if current.status.is_done() {
            return Err(ClientError::AlreadyDone(current.id));
        }
        let id = current.id;
        let mut replacement = current.to_replacement();
        replacement.status = TaskStatus::Done;

        self.replace(id, replacement, "mark task done").await
    }

    /// 削除する。成功したら mirror からも同じタスクを取り除く。
    pub async fn delete(&mut self, key: TaskKey) -> Result<(), ClientError> {
        let id = self.resolve(key)?.id;
        if let Err(e) = self.store.remove(TaskKey::Id(id)).await {
            return Err(self.failed("delete task", e));
        }
        self.sync(|tasks| tasks.retain(|task| task.id != id)).await;
        Ok(())
    }

    /// mirror 上でキーを解決する。
    pub fn resolve(&self, key: TaskKey) -> Result<&Task, ClientError> {
        key.position(&self.tasks)
            .map(|position| &self.tasks[position])
            .map_err(|_| ClientError::UnknownTask(key))
    }

    async fn replace(
        &mut self,
        id: TaskId,
        replacement: TaskReplacement,
        action: &str,
    ) -> Result<&Task, ClientError> {
        let stored = match self.store.replace(TaskKey::Id(id), replacement).await {
            Ok(task) => task,
            Err(e) => return Err(self.failed(action, e)),
        };
        self.sync(|tasks| {
            if let Some(slot) = tasks.iter_mut().find(|task| task.id == stored.id) {
                *slot = stored;
            }
        })
        .await;
        self.find(id)
    }

    /// 成功した変更を mirror に反映する。
    ///
    /// Refetch で取り直しに失敗した場合は、応答の適用にフォールバックする。
    async fn sync(&mut self, apply: impl FnOnce(&mut Vec<Task>)) {
        if self.policy == SyncPolicy::Refetch {
            match self.store.list().await {
                Ok(tasks) => {
                    self.tasks = tasks;
                    return;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "refetch after mutation failed, applying response locally");
                }
            }
        }
        apply(&mut self.tasks);
    }

    fn find(&self, id: TaskId) -> Result<&Task, ClientError> {
        self.resolve(TaskKey::Id(id))
    }

    fn failed(&self, action: &str, error: StoreError) -> ClientError {
        tracing::error!(%error, kind = ?error.kind(), "failed to {action}");
        ClientError::Store(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use chrono::{Duration, FixedOffset};
    use chrono_tz::America::New_York;
    use rstest::rstest;

    use crate::impls::{InMemoryTaskStore, TaskFactory};
    use crate::ports::FixedClock;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 17, 12, 0, 0).unwrap()
    }

    fn store(clock: &FixedClock) -> Arc<InMemoryTaskStore> {
        Arc::new(InMemoryTaskStore::with_factory(TaskFactory::with_clock(
            Arc::new(clock.clone()),
        )))
    }

    /// 指定した操作だけ失敗させるストア
    struct FlakyStore {
        inner: InMemoryTaskStore,
        fail: AtomicBool,
    }

    impl FlakyStore {
        fn new() -> Self {
            Self {
                inner: InMemoryTaskStore::new(),
                fail: AtomicBool::new(false),
            }
        }

        fn check(&self) -> Result<(), StoreError> {
            if self.fail.load(Ordering::SeqCst) {
                Err(StoreError::Write {
                    path: "tasks.json".into(),
                    source: std::io::Error::other("disk full"),
                })
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl TaskStore for FlakyStore {
        async fn list(&self) -> Result<Vec<Task>, StoreError> {
            self.check()?;
            self.inner.list().await
        }
        async fn append(&self, new_task: NewTask) -> Result<Task, StoreError> {
            self.check()?;
            self.inner.append(new_task).await
        }
        async fn replace(
            &self,
            key: TaskKey,
            replacement: TaskReplacement,
        ) -> Result<Task, StoreError> {
            self.check()?;
            self.inner.replace(key, replacement).await
        }
        async fn remove(&self, key: TaskKey) -> Result<(), StoreError> {
            self.check()?;
            self.inner.remove(key).await
        }
    }

    fn at(day: (i32, u32, u32), hm: (u32, u32)) -> (NaiveDate, NaiveTime) {
        (
            NaiveDate::from_ymd_opt(day.0, day.1, day.2).unwrap(),
            NaiveTime::from_hms_opt(hm.0, hm.1, 0).unwrap(),
        )
    }

    #[test]
    fn compose_due_applies_a_fixed_offset() {
        let (day, time) = at((2026, 10, 18), (9, 30));
        let kathmandu = FixedOffset::east_opt(5 * 3600 + 45 * 60).unwrap();

        assert_eq!(
            compose_due(day, time, &Utc).unwrap(),
            Utc.with_ymd_and_hms(2026, 10, 18, 9, 30, 0).unwrap()
        );
        assert_eq!(
            compose_due(day, time, &kathmandu).unwrap(),
            Utc.with_ymd_and_hms(2026, 10, 18, 3, 45, 0).unwrap()
        );
    }

    #[rstest]
    #[case((2026, 10, 17), Utc.with_ymd_and_hms(2026, 10, 17, 13, 0, 0).unwrap())]
    #[case((2026, 12, 15), Utc.with_ymd_and_hms(2026, 12, 15, 14, 0, 0).unwrap())]
    fn compose_due_uses_the_offset_of_that_day(
        #[case] day: (i32, u32, u32),
        #[case] expected: DateTime<Utc>,
    ) {
        let (day, time) = at(day, (9, 0));

        assert_eq!(compose_due(day, time, &New_York).unwrap(), expected);
    }

    #[test]
    fn compose_due_takes_the_earlier_of_a_repeated_hour() {
        // 2026-11-01 01:30 happens twice in New York
        let (day, time) = at((2026, 11, 1), (1, 30));

        assert_eq!(
            compose_due(day, time, &New_York).unwrap(),
            Utc.with_ymd_and_hms(2026, 11, 1, 5, 30, 0).unwrap()
        );
    }

    #[test]
    fn compose_due_rejects_skipped_and_unrepresentable_times() {
        // 2026-03-08 02:30 is skipped in New York
        let (day, time) = at((2026, 3, 8), (2, 30));
        assert!(matches!(
            compose_due(day, time, &New_York),
            Err(ClientError::NonexistentLocalTime(_))
        ));

        let west = FixedOffset::west_opt(5 * 3600).unwrap();
        let last = NaiveTime::from_hms_opt(23, 0, 0).unwrap();
        assert!(matches!(
            compose_due(NaiveDate::MAX, last, &west),
            Err(ClientError::NonexistentLocalTime(_))
        ));
    }

    #[tokio::test]
    async fn add_across_a_dst_change_keeps_the_wall_clock_time() {
        let clock = FixedClock::new(now());
        let mut client = TaskClient::with_clock(store(&clock), clock.clone()).with_timezone(New_York);
        let (day, time) = at((2026, 12, 15), (9, 0));

        let task = client.add("Dentist", day, time).await.unwrap();

        assert_eq!(task.date, Utc.with_ymd_and_hms(2026, 12, 15, 14, 0, 0).unwrap());
        assert_eq!(task.date.with_timezone(&New_York).time(), time);
    }

    #[tokio::test]
    async fn add_classifies_and_mirrors_the_response() {
        let clock = FixedClock::new(now());
        let store = store(&clock);
        let mut client = TaskClient::with_clock(Arc::clone(&store), clock.clone());

        let tomorrow = now().date_naive().succ_opt().unwrap();
        let time = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        let added = client.add("Buy milk", tomorrow, time).await.unwrap().clone();
        let overdue = client
            .add_at("Pay rent", now() - Duration::days(1))
            .await
            .unwrap()
            .clone();

        assert_eq!(added.status, TaskStatus::Pending);
        assert_eq!(overdue.status, TaskStatus::Overdue);
        assert_eq!(client.tasks(), store.list().await.unwrap().as_slice());
    }

    #[tokio::test]
    async fn add_at_exactly_now_is_overdue() {
        let clock = FixedClock::new(now());
        let mut client = TaskClient::with_clock(store(&clock), clock.clone());

        let task = client.add_at("now", now()).await.unwrap();

        assert_eq!(task.status, TaskStatus::Overdue);
    }

    #[tokio::test]
    async fn blank_text_never_reaches_the_store() {
        let clock = FixedClock::new(now());
        let store = store(&clock);
        let mut client = TaskClient::with_clock(Arc::clone(&store), clock.clone());

        let result = client.add_at("   ", now()).await;

        assert!(matches!(result, Err(ClientError::EmptyText)));
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn edit_merges_fields_and_reclassifies() {
        let clock = FixedClock::new(now());
        let mut client = TaskClient::with_clock(store(&clock), clock.clone());
        let task = client
            .add_at("Call mom", now() - Duration::hours(1))
            .await
            .unwrap()
            .clone();
        assert_eq!(task.status, TaskStatus::Overdue);

        let edited = client
            .edit(TaskKey::Id(task.id), TaskEdit::date(now() + Duration::days(2)))
            .await
            .unwrap();

        assert_eq!(edited.text, "Call mom");
        assert_eq!(edited.status, TaskStatus::Pending);
        assert_eq!(edited.version, 2);
    }

    #[tokio::test]
    async fn edit_keeps_done() {
        let clock = FixedClock::new(now());
        let mut client = TaskClient::with_clock(store(&clock), clock.clone());
        let id = client.add_at("a", now() + Duration::days(1)).await.unwrap().id;
        client.mark_done(TaskKey::Id(id)).await.unwrap();

        let edited = client
            .edit(TaskKey::Id(id), TaskEdit::date(now() - Duration::days(3)))
            .await
            .unwrap();

        assert_eq!(edited.status, TaskStatus::Done);
    }

    #[tokio::test]
    async fn mark_done_twice_is_rejected_locally() {
        let clock = FixedClock::new(now());
        let mut client = TaskClient::with_clock(store(&clock), clock.clone());
        let id = client.add_at("a", now()).await.unwrap().id;

        client.mark_done(TaskKey::Index(0)).await.unwrap();
        let again = client.mark_done(TaskKey::Index(0)).await;

        assert!(matches!(again, Err(ClientError::AlreadyDone(done)) if done == id));
    }

    #[tokio::test]
    async fn delete_shifts_the_mirror_like_the_store() {
        let clock = FixedClock::new(now());
        let store = store(&clock);
        let mut client = TaskClient::with_clock(Arc::clone(&store), clock.clone());
        for text in ["a", "b", "c"] {
            client.add_at(text, now()).await.unwrap();
        }

        client.delete(TaskKey::Index(1)).await.unwrap();

        let texts: Vec<_> = client.tasks().iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, ["a", "c"]);
        assert_eq!(client.tasks(), store.list().await.unwrap().as_slice());
    }

    #[tokio::test]
    async fn unknown_key_is_rejected_before_the_store() {
        let clock = FixedClock::new(now());
        let mut client = TaskClient::with_clock(store(&clock), clock.clone());

        let result = client.delete(TaskKey::Index(0)).await;

        assert!(matches!(result, Err(ClientError::UnknownTask(TaskKey::Index(0)))));
    }

    #[tokio::test]
    async fn failed_mutation_leaves_the_mirror_unchanged() {
        let store = Arc::new(FlakyStore::new());
        let mut client = TaskClient::new(Arc::clone(&store));
        client.add_at("a", Utc::now()).await.unwrap();
        let before = client.tasks().to_vec();

        store.fail.store(true, Ordering::SeqCst);
        assert!(client.add_at("b", Utc::now()).await.is_err());
        assert!(client.mark_done(TaskKey::Index(0)).await.is_err());
        assert!(client.delete(TaskKey::Index(0)).await.is_err());

        assert_eq!(client.tasks(), before.as_slice());
    }

    #[tokio::test]
    async fn failed_load_keeps_the_previous_mirror() {
        let store = Arc::new(FlakyStore::new());
        let mut client = TaskClient::new(Arc::clone(&store));
        client.add_at("a", Utc::now()).await.unwrap();

        store.fail.store(true, Ordering::SeqCst);
        let result = client.load().await;

        assert!(matches!(result, Err(ClientError::Store(_))));
        assert_eq!(client.tasks().len(), 1);
    }

    #[tokio::test]
    async fn refetch_policy_picks_up_other_writers() {
        let clock = FixedClock::new(now());
        let store = store(&clock);
        let mut client = TaskClient::with_clock(Arc::clone(&store), clock.clone())
            .with_policy(SyncPolicy::Refetch);

        // 別のクライアントによる追加
        store.append(NewTask::new("from elsewhere", now())).await.unwrap();
        client.add_at("mine", now()).await.unwrap();

        let texts: Vec<_> = client.tasks().iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, ["from elsewhere", "mine"]);
    }

    #[tokio::test]
    async fn stale_mirror_gets_a_conflict_instead_of_overwriting() {
        let clock = FixedClock::new(now());
        let store = store(&clock);
        let mut first = TaskClient::with_clock(Arc::clone(&store), clock.clone());
        let mut second = TaskClient::with_clock(Arc::clone(&store), clock.clone());
        first.add_at("shared", now() + Duration::days(1)).await.unwrap();
        second.load().await.unwrap();

        first.edit(TaskKey::Index(0), TaskEdit::text("first wins")).await.unwrap();
        let result = second.edit(TaskKey::Index(0), TaskEdit::text("second")).await;

        assert!(matches!(
            result,
            Err(ClientError::Store(StoreError::VersionConflict { .. }))
        ));
        assert_eq!(store.list().await.unwrap()[0].text, "first wins");
    }

    #[tokio::test]
    async fn end_to_end_scenario() {
        let clock = FixedClock::new(now());
        let store = store(&clock);
        let mut client = TaskClient::with_clock(Arc::clone(&store), clock.clone());
        client.load().await.unwrap();
        assert!(client.tasks().is_empty());

        let tomorrow = now() + Duration::days(1);
        client.add_at("Buy milk", tomorrow).await.unwrap();
        let listed = store.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].status, TaskStatus::Pending);

        client.mark_done(TaskKey::Index(0)).await.unwrap();
        let listed = store.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].status, TaskStatus::Done);

        client.delete(TaskKey::Index(0)).await.unwrap();
        assert!(store.list().await.unwrap().is_empty());
        assert!(client.tasks().is_empty());
    }
}
