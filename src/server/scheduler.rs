use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// 最後の編集からパイプライン実行までの待ち時間
pub const UPDATE_DELAY: Duration = Duration::from_millis(150);

/// キーごとのデバウンス
///
/// 遅延中に同じキーで再度スケジュールされると、古い方は実行されない。
/// 同じキーのパイプラインは直列に実行される（前回の実行中なら完了を待つ）。
/// 世代番号は全キー共通で単調増加するので、エントリを消しても再利用されない。
pub struct Debouncer<K> {
    delay: Duration,
    next_generation: AtomicU64,
    /// キーごとの最新の世代。最後の世代が実行されたら消す
    generations: Arc<DashMap<K, u64>>,
    /// 誰も待っていなければ実行後に消す
    locks: Arc<DashMap<K, Arc<Mutex<()>>>>,
}

impl<K> Debouncer<K>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
{
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            next_generation: AtomicU64::new(0),
            generations: Arc::new(DashMap::new()),
            locks: Arc::new(DashMap::new()),
        }
    }

    /// 遅延後に `run` を実行する。実行されたかどうかをハンドルで返す
    pub fn schedule<F, Fut>(&self, key: K, run: F) -> JoinHandle<bool>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed) + 1;
        self.generations.insert(key.clone(), generation);

        let delay = self.delay;
        let generations = Arc::clone(&self.generations);
        let locks = Arc::clone(&self.locks);

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            // 新しい編集が来ていればスキップ
            if generations.get(&key).map(|v| *v) != Some(generation) {
                return false;
            }

            let lock = locks.entry(key.clone()).or_default().value().clone();
            let _guard = lock.lock().await;

            // 前回の実行を待っている間に追い越された
            if generations.get(&key).map(|v| *v) != Some(generation) {
                return false;
            }

            run().await;

            generations.remove_if(&key, |_, latest| *latest == generation);
            // マップと自分以外に参照があれば、次の実行がこのロックを待っている
            locks.remove_if(&key, |_, entry| Arc::strong_count(entry) == 2);
            true
        })
    }
}

impl<K> Default for Debouncer<K>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new(UPDATE_DELAY)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio::time::Instant;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_burst_of_edits_runs_once() {
        let debouncer = Debouncer::default();
        let runs = Arc::new(AtomicUsize::new(0));
        let started_at = Arc::new(std::sync::Mutex::new(None));
        let mut last_edit = None;

        let mut handles = Vec::new();
        for edit in 0..5 {
            if edit > 0 {
                tokio::time::sleep(Duration::from_millis(40)).await;
            }
            last_edit = Some(Instant::now());
            let runs = Arc::clone(&runs);
            let started_at = Arc::clone(&started_at);
            handles.push(debouncer.schedule("a.js", move || async move {
                runs.fetch_add(1, Ordering::SeqCst);
                *started_at.lock().unwrap() = Some(Instant::now());
            }));
        }

        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.unwrap());
        }

        assert_eq!(results, vec![false, false, false, false, true]);
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        let ran_at = started_at.lock().unwrap().unwrap();
        // 最後の編集からちょうど150ms後に1回だけ実行される
        assert_eq!(ran_at - last_edit.unwrap(), UPDATE_DELAY);
    }

    #[tokio::test(start_paused = true)]
    async fn test_keys_are_independent() {
        let debouncer = Debouncer::default();
        let runs = Arc::new(AtomicUsize::new(0));

        let a = {
            let runs = Arc::clone(&runs);
            debouncer.schedule("a.js", move || async move {
                runs.fetch_add(1, Ordering::SeqCst);
            })
        };
        let b = {
            let runs = Arc::clone(&runs);
            debouncer.schedule("b.js", move || async move {
                runs.fetch_add(1, Ordering::SeqCst);
            })
        };

        assert!(a.await.unwrap());
        assert!(b.await.unwrap());
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_for_same_key_do_not_overlap() {
        let debouncer = Debouncer::default();
        let active = Arc::new(AtomicUsize::new(0));
        let max_active = Arc::new(AtomicUsize::new(0));

        let slow_run = |active: Arc<AtomicUsize>, max_active: Arc<AtomicUsize>| {
            move || async move {
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                max_active.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(500)).await;
                active.fetch_sub(1, Ordering::SeqCst);
            }
        };

        let first = debouncer.schedule(
            "a.js",
            slow_run(Arc::clone(&active), Arc::clone(&max_active)),
        );
        // 1回目の実行中（150ms〜650ms）に再スケジュール
        tokio::time::sleep(Duration::from_millis(200)).await;
        let second = debouncer.schedule(
            "a.js",
            slow_run(Arc::clone(&active), Arc::clone(&max_active)),
        );

        assert!(first.await.unwrap());
        assert!(second.await.unwrap());
        assert_eq!(max_active.load(Ordering::SeqCst), 1);
        assert_eq!(debouncer.generations.len(), 0);
        assert!(debouncer.locks.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_entries_dropped_after_final_run() {
        let debouncer = Debouncer::default();

        let first = debouncer.schedule("a.js", || async {});
        let second = debouncer.schedule("a.js", || async {});
        assert_eq!(debouncer.generations.len(), 1);

        assert!(!first.await.unwrap());
        assert!(second.await.unwrap());
        assert_eq!(debouncer.generations.len(), 0);
        assert!(debouncer.locks.is_empty());

        // 消した後に同じキーで予約しても実行される
        assert!(debouncer.schedule("a.js", || async {}).await.unwrap());
        assert_eq!(debouncer.generations.len(), 0);
    }
}
